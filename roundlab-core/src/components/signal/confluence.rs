//! Confluence signal — majority vote across member generators.
//!
//! Each member sees the same round and history. The signal fires when at least
//! `min_agree` members call the same direction and they strictly outnumber the
//! members calling the opposite direction. Strength is the mean strength of the
//! agreeing members.

use crate::components::history::{History, RoundView};
use crate::domain::Side;

use super::{SignalDecision, SignalGenerator};

pub struct Confluence {
    members: Vec<Box<dyn SignalGenerator>>,
    min_agree: usize,
    lookback: usize,
}

impl Confluence {
    pub fn new(members: Vec<Box<dyn SignalGenerator>>, min_agree: usize) -> Self {
        assert!(!members.is_empty(), "confluence needs at least one member");
        assert!(
            (1..=members.len()).contains(&min_agree),
            "min_agree must be between 1 and the member count"
        );
        let lookback = members.iter().map(|m| m.lookback()).max().unwrap_or(0);
        Self {
            members,
            min_agree,
            lookback,
        }
    }

    pub fn members(&self) -> &[Box<dyn SignalGenerator>] {
        &self.members
    }
}

impl SignalGenerator for Confluence {
    fn name(&self) -> &str {
        "confluence"
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn generate(&self, round: &RoundView<'_>, history: &History<'_>) -> Option<SignalDecision> {
        let (mut up, mut down) = (Tally::default(), Tally::default());
        for vote in self
            .members
            .iter()
            .filter_map(|m| m.generate(round, &history.tail(m.lookback())))
        {
            match vote.direction {
                Side::Up => up.add(&vote),
                Side::Down => down.add(&vote),
            }
        }

        let (side, agree, dissent) = if up.count >= down.count {
            (Side::Up, up, down.count)
        } else {
            (Side::Down, down, up.count)
        };
        if agree.count < self.min_agree || agree.count <= dissent {
            return None;
        }

        Some(SignalDecision {
            direction: side,
            strength: agree.strength / agree.count as f64,
            implied_payout: agree.implied_payout,
        })
    }
}

/// Running vote count for one side.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    count: usize,
    strength: f64,
    /// First priced member's payout, in member order.
    implied_payout: Option<f64>,
}

impl Tally {
    fn add(&mut self, vote: &SignalDecision) {
        self.count += 1;
        self.strength += vote.strength;
        self.implied_payout = self.implied_payout.or(vote.implied_payout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::signal::test_support::round_with_close;
    use crate::components::signal::NullSignal;

    struct Fixed(Side, f64, usize);

    impl SignalGenerator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn lookback(&self) -> usize {
            self.2
        }
        fn generate(&self, _round: &RoundView<'_>, history: &History<'_>) -> Option<SignalDecision> {
            if history.len() < self.2 {
                return None;
            }
            Some(SignalDecision {
                direction: self.0,
                strength: self.1,
                implied_payout: Some(1.9),
            })
        }
    }

    fn eval(sig: &Confluence) -> Option<SignalDecision> {
        let records: Vec<_> = (0..5).map(|i| round_with_close(i, 100.0)).collect();
        let current = round_with_close(5, 100.0);
        sig.generate(&RoundView::new(&current), &History::new(&records))
    }

    #[test]
    fn unanimous_members_fire_with_mean_strength() {
        let sig = Confluence::new(
            vec![Box::new(Fixed(Side::Up, 1.0, 0)), Box::new(Fixed(Side::Up, 3.0, 2))],
            2,
        );
        let d = eval(&sig).unwrap();
        assert_eq!(d.direction, Side::Up);
        assert!((d.strength - 2.0).abs() < 1e-12);
        assert_eq!(d.implied_payout, Some(1.9));
        assert_eq!(sig.lookback(), 2);
    }

    #[test]
    fn tie_does_not_fire() {
        let sig = Confluence::new(
            vec![Box::new(Fixed(Side::Up, 1.0, 0)), Box::new(Fixed(Side::Down, 1.0, 0))],
            1,
        );
        assert!(eval(&sig).is_none());
    }

    #[test]
    fn abstaining_members_count_toward_neither_side() {
        let sig = Confluence::new(
            vec![
                Box::new(Fixed(Side::Down, 1.0, 0)),
                Box::new(NullSignal),
                Box::new(Fixed(Side::Down, 1.0, 0)),
            ],
            2,
        );
        assert_eq!(eval(&sig).unwrap().direction, Side::Down);
    }

    #[test]
    fn below_min_agree_does_not_fire() {
        let sig = Confluence::new(
            vec![Box::new(Fixed(Side::Up, 1.0, 0)), Box::new(NullSignal)],
            2,
        );
        assert!(eval(&sig).is_none());
    }

    #[test]
    fn payout_comes_from_first_priced_agreeing_member() {
        struct Priced(Side, Option<f64>);
        impl SignalGenerator for Priced {
            fn name(&self) -> &str {
                "priced"
            }
            fn lookback(&self) -> usize {
                0
            }
            fn generate(
                &self,
                _round: &RoundView<'_>,
                _history: &History<'_>,
            ) -> Option<SignalDecision> {
                Some(SignalDecision {
                    direction: self.0,
                    strength: 2.0,
                    implied_payout: self.1,
                })
            }
        }
        let sig = Confluence::new(
            vec![
                Box::new(Priced(Side::Down, Some(3.0))),
                Box::new(Priced(Side::Up, None)),
                Box::new(Priced(Side::Up, Some(1.4))),
                Box::new(Priced(Side::Up, Some(1.6))),
            ],
            2,
        );
        let d = eval(&sig).unwrap();
        assert_eq!(d.direction, Side::Up);
        assert_eq!(d.implied_payout, Some(1.4));
        assert!((d.strength - 2.0).abs() < 1e-12);
    }

    #[test]
    fn member_lookback_is_respected() {
        // Member needing 9 rounds abstains on a 5-round history.
        let sig = Confluence::new(
            vec![Box::new(Fixed(Side::Up, 1.0, 0)), Box::new(Fixed(Side::Up, 1.0, 9))],
            2,
        );
        assert!(eval(&sig).is_none());
    }
}
