/// The sound timer only says *when* a tone should play. Whatever actually
/// makes a noise sits behind this trait.
pub trait Sound {
    /// the sound timer went from zero to non-zero
    fn start(&mut self);

    /// the sound timer ran down to zero
    fn stop(&mut self);
}

/// what the sound timer did during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneChange {
    Start,
    Stop,
}

impl ToneChange {
    /// forward to a sound device
    pub fn apply<S: Sound + ?Sized>(self, sound: &mut S) {
        match self {
            ToneChange::Start => sound.start(),
            ToneChange::Stop => sound.stop(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Mute;

impl Mute {
    pub fn new() -> Self {
        Mute
    }
}

impl Sound for Mute {
    fn start(&mut self) {}

    fn stop(&mut self) {}
}
