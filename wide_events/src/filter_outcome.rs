/// The three-valued decision a filter function returns for a finished event.
///
/// `Keep` stores the event unconditionally, `Discard` drops it
/// unconditionally, and `Sample` stores it with probability equal to the
/// emitter's sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Always store the event, regardless of sample rate.
    Keep,
    /// Store the event with probability equal to the configured sample rate.
    Sample,
    /// Never store the event.
    Discard,
}

impl FilterOutcome {
    /// Combines two outcomes toward `Discard`: `Discard` beats `Sample`
    /// beats `Keep`. Commutative, associative, and idempotent, so outcomes
    /// from independent filter stages can be folded in any order.
    pub fn most_restrictive(self, other: Self) -> Self {
        match self {
            Self::Keep => other,
            Self::Sample => match other {
                Self::Keep => Self::Sample,
                _ => other,
            },
            Self::Discard => Self::Discard,
        }
    }

    /// Combines two outcomes toward `Keep`: `Keep` beats `Sample` beats
    /// `Discard`. Commutative, associative, and idempotent.
    pub fn least_restrictive(self, other: Self) -> Self {
        match self {
            Self::Keep => Self::Keep,
            Self::Sample => match other {
                Self::Discard => Self::Sample,
                _ => other,
            },
            Self::Discard => other,
        }
    }
}
