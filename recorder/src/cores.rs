//! Identity of the execution core an event is recorded on

pub trait CoreIdentity: Send + Sync {
    fn current_core(&self) -> usize;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SingleCore;

impl CoreIdentity for SingleCore {
    fn current_core(&self) -> usize {
        0
    }
}

/// Always reports the same core, handy when a recorder instance is bound to
/// one core.
#[derive(Debug, Clone, Copy)]
pub struct FixedCore(pub usize);

impl CoreIdentity for FixedCore {
    fn current_core(&self) -> usize {
        self.0
    }
}

impl<F> CoreIdentity for F
where
    F: Fn() -> usize + Send + Sync,
{
    fn current_core(&self) -> usize {
        self()
    }
}
