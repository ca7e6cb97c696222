use derive_more::{Add, AddAssign};

/// `ProbeId` newtype.
///
/// The identifier carried in the `Identifier` field of each echo request.
/// All probes in a run share a single identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProbeId(pub u16);

/// `Sequence` newtype.
///
/// The sequence number carried in the `Sequence` field of each echo request.
/// Each probe in a run has a distinct sequence number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Add, AddAssign)]
pub struct Sequence(pub u16);

/// `TimeToLive` newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeToLive(pub u8);

impl From<Sequence> for usize {
    fn from(sequence: Sequence) -> Self {
        Self::from(sequence.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_add() {
        let mut sequence = Sequence(10);
        sequence += Sequence(1);
        assert_eq!(Sequence(11), sequence);
        assert_eq!(Sequence(13), sequence + Sequence(2));
    }

    #[test]
    fn test_sequence_to_usize() {
        assert_eq!(0_usize, usize::from(Sequence(0)));
        assert_eq!(65535_usize, usize::from(Sequence(u16::MAX)));
    }
}
