//! Channel layout bitmasks (front-left = bit 0, front-right = bit 1, ...).

pub const FRONT_LEFT: u64 = 0x1;
pub const FRONT_RIGHT: u64 = 0x2;
pub const FRONT_CENTER: u64 = 0x4;
pub const LOW_FREQUENCY: u64 = 0x8;
pub const BACK_LEFT: u64 = 0x10;
pub const BACK_RIGHT: u64 = 0x20;
pub const BACK_CENTER: u64 = 0x100;
pub const SIDE_LEFT: u64 = 0x200;
pub const SIDE_RIGHT: u64 = 0x400;

/// An audio channel layout expressed as a speaker bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelLayout(pub u64);

/// Default layouts indexed by `channels - 1`.
static DEFAULT_LAYOUTS: [u64; 8] = [
    FRONT_CENTER,
    FRONT_LEFT | FRONT_RIGHT,
    FRONT_LEFT | FRONT_RIGHT | FRONT_CENTER,
    FRONT_LEFT | FRONT_RIGHT | BACK_LEFT | BACK_RIGHT,
    FRONT_LEFT | FRONT_RIGHT | FRONT_CENTER | BACK_LEFT | BACK_RIGHT,
    FRONT_LEFT | FRONT_RIGHT | FRONT_CENTER | LOW_FREQUENCY | BACK_LEFT | BACK_RIGHT,
    FRONT_LEFT | FRONT_RIGHT | FRONT_CENTER | LOW_FREQUENCY | BACK_LEFT | BACK_RIGHT | BACK_CENTER,
    FRONT_LEFT
        | FRONT_RIGHT
        | FRONT_CENTER
        | LOW_FREQUENCY
        | BACK_LEFT
        | BACK_RIGHT
        | SIDE_LEFT
        | SIDE_RIGHT,
];

impl ChannelLayout {
    pub const MONO: Self = Self(FRONT_CENTER);
    pub const STEREO: Self = Self(FRONT_LEFT | FRONT_RIGHT);

    /// The conventional layout for `channels` channels, if one is defined.
    pub fn default_for(channels: usize) -> Option<Self> {
        channels
            .checked_sub(1)
            .and_then(|i| DEFAULT_LAYOUTS.get(i))
            .map(|&mask| Self(mask))
    }

    pub fn channels(self) -> usize {
        self.0.count_ones() as usize
    }

    /// `true` if this layout is a plausible description of `channels` channels.
    pub fn matches(self, channels: usize) -> bool {
        self.channels() == channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layouts_have_matching_counts() {
        for n in 1..=8 {
            let layout = ChannelLayout::default_for(n).expect("layout");
            assert_eq!(layout.channels(), n);
        }
        assert_eq!(ChannelLayout::default_for(0), None);
        assert_eq!(ChannelLayout::default_for(9), None);
    }

    #[test]
    fn mono_and_stereo() {
        assert_eq!(ChannelLayout::default_for(1), Some(ChannelLayout::MONO));
        assert_eq!(ChannelLayout::default_for(2), Some(ChannelLayout::STEREO));
        assert!(ChannelLayout::STEREO.matches(2));
        assert!(!ChannelLayout::STEREO.matches(1));
    }
}
