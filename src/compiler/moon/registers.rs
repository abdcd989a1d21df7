use std::fmt;

/// A Moon general-purpose register. The machine reserves `r0` (always
/// zero), `r12` (frame pointer), `r13` (return value), `r14` (stack
/// pointer), and `r15` (jump link); the pool below hands out the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reg(pub u8);

pub const ZERO: Reg = Reg(0);
pub const FRAME: Reg = Reg(12);
pub const RETVAL: Reg = Reg(13);
pub const STACK: Reg = Reg(14);
pub const LINK: Reg = Reg(15);

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// The fixed scratch pool `r1..r11`, managed as a stack. Emitter rules
/// acquire and release in LIFO order, so well-formed input never exhausts
/// the pool.
pub struct RegisterPool {
    free: Vec<Reg>,
}

impl RegisterPool {
    pub fn new() -> RegisterPool {
        RegisterPool {
            free: (1..=11).rev().map(Reg).collect(),
        }
    }

    pub fn acquire(&mut self) -> Reg {
        self.free.pop().expect("register pool exhausted")
    }

    pub fn release(&mut self, reg: Reg) {
        self.free.push(reg);
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}

impl Default for RegisterPool {
    fn default() -> Self {
        RegisterPool::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_hands_out_r1_first() {
        let mut pool = RegisterPool::new();
        assert_eq!(pool.acquire(), Reg(1));
        assert_eq!(pool.acquire(), Reg(2));
        assert_eq!(pool.available(), 9);
    }

    #[test]
    fn lifo_release_returns_the_same_register() {
        let mut pool = RegisterPool::new();
        let r = pool.acquire();
        pool.release(r);
        assert_eq!(pool.acquire(), r);
    }

    #[test]
    fn registers_render_with_their_index() {
        assert_eq!(Reg(7).to_string(), "r7");
        assert_eq!(FRAME.to_string(), "r12");
        assert_eq!(STACK.to_string(), "r14");
    }
}
