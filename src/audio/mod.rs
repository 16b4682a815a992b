use std::io::{self, Write};

/// Fire-and-forget ground impact sound. Implementations must never fail the caller.
pub trait ImpactCue {
    fn play(&mut self);
}

#[derive(Debug, Default)]
pub struct Silent;

impl ImpactCue for Silent {
    fn play(&mut self) {}
}

/// Rings the terminal bell.
#[derive(Debug)]
pub struct TerminalBell<W: Write> {
    out: W,
}

impl TerminalBell<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn ring(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x07")?;
        self.out.flush()
    }
}

impl<W: Write> ImpactCue for TerminalBell<W> {
    fn play(&mut self) {
        if let Err(err) = self.ring() {
            tracing::debug!(%err, "impact cue failed");
        }
    }
}
