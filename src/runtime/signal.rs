/// Identifies one dynamic invocation of `Begin`. Only the invocation that
/// minted a token may catch it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignalToken(u64);

/// Non-local exits. Neither is an error: `Stop` halts the whole run, and a
/// `Begin` escape returns early from its own `Begin` block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Stop,
    Begin(SignalToken),
}

#[derive(Debug, Default)]
pub struct TokenSource {
    next: u64,
}

impl TokenSource {
    pub fn mint(&mut self) -> SignalToken {
        self.next += 1;
        SignalToken(self.next)
    }
}
