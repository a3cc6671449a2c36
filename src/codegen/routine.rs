/// Arithmetic selected by an enum-dispatched case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

/// A single op body, referencing input buffers by index and writing the
/// first output slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kernel {
    /// Scalar arithmetic over two inputs. Integer division truncates.
    Binary {
        op: BinaryOp,
        lhs: usize,
        rhs: usize,
    },
    /// Acquire the input buffer into an opaque handle.
    WrapHandle { input: usize },
    /// Read an opaque handle's payload back out.
    UnwrapHandle { input: usize },
}

/// One arm of a generated dispatch switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchCase {
    pub name: String,
    pub value: i64,
    pub kernel: Kernel,
}

/// The structured form of a generated routine, lowered alongside the
/// rendered source text so an in-process toolchain can assemble it without
/// parsing C.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routine {
    /// Switch over a runtime selector, one case per enumerated name.
    Dispatch { cases: Vec<DispatchCase> },
    /// Unconditional single body.
    Straight { kernel: Kernel },
}
