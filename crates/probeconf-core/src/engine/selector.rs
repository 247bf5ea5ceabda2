//! Choosing one installation among the probed candidates.

use crate::domain::{Candidate, PackageDescriptor, ProbeResult, Tier, UserIntent};
use crate::error::{Attempt, Attempts, ConfigureError, ConfigureResult};
use crate::options::OverridePolicy;
use tracing::{info, warn};

/// How many candidates to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Stop at the first working candidate
    #[default]
    FirstSuccess,
    /// Probe every candidate and rank the working ones
    BestOfAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectorConfig {
    pub policy: SelectionPolicy,
    pub require_shared: bool,
    pub override_policy: OverridePolicy,
    /// Whether finding nothing aborts the run
    pub mandatory: bool,
}

/// Result of a selection that did not abort the run.
#[derive(Debug)]
pub enum Verdict {
    Selected {
        result: ProbeResult,
        attempts: Attempts,
    },
    NotFound(Attempts),
}

pub struct Selector {
    config: SelectorConfig,
}

/// Tracks a tier the user asked for explicitly, until it yields a success
/// or is exhausted.
struct PendingIntent {
    tier: Tier,
    intent: UserIntent,
    succeeded: bool,
}

impl Selector {
    pub const fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Probe candidates in order and pick one.
    ///
    /// Candidates of the user-intent tiers (explicit libraries, explicit
    /// root, explicit download) restrict the search: once one of them works
    /// no discovered candidate is considered, and when all of them fail the
    /// run aborts unless the override policy is fall-through.
    pub fn select<I, F>(
        &self,
        descriptor: &PackageDescriptor,
        candidates: I,
        mut probe: F,
    ) -> ConfigureResult<Verdict>
    where
        I: IntoIterator<Item = ConfigureResult<Candidate>>,
        F: FnMut(&Candidate) -> ConfigureResult<ProbeResult>,
    {
        let mut attempts = Attempts::default();
        let mut successes: Vec<ProbeResult> = Vec::new();
        let mut non_shared: usize = 0;
        let mut pending: Option<PendingIntent> = None;

        for next in candidates {
            let candidate = next?;

            if let Some(intent) = &pending
                && candidate.tier() != intent.tier
            {
                if intent.succeeded {
                    break;
                }
                self.intent_failed(descriptor, intent, &attempts)?;
                pending = None;
            }
            if pending.is_none()
                && let Some(intent) = candidate.intent()
                && is_intent_tier(candidate.tier())
            {
                pending = Some(PendingIntent {
                    tier: candidate.tier(),
                    intent: intent.clone(),
                    succeeded: false,
                });
            }

            let result = probe(&candidate)?;
            if !result.is_success() {
                attempts.push(Attempt::from_result(&result));
                continue;
            }
            if self.config.require_shared && !result.resolved().is_some_and(|r| r.shared) {
                info!(package = %descriptor.key, candidate = %candidate, "Skipping static installation");
                attempts.push(Attempt::new(candidate.name(), candidate.tier(), "not a shared library"));
                non_shared += 1;
                continue;
            }

            info!(package = %descriptor.key, candidate = %candidate, "Found working installation");
            if let Some(intent) = pending.as_mut() {
                intent.succeeded = true;
            }
            successes.push(result);
            if self.config.policy == SelectionPolicy::FirstSuccess {
                break;
            }
        }

        if let Some(intent) = &pending
            && !intent.succeeded
        {
            self.intent_failed(descriptor, intent, &attempts)?;
        }

        let chosen = match self.config.policy {
            SelectionPolicy::FirstSuccess => successes.into_iter().next(),
            SelectionPolicy::BestOfAll => best(successes),
        };
        if let Some(result) = chosen {
            return Ok(Verdict::Selected { result, attempts });
        }

        if non_shared > 0 {
            return Err(ConfigureError::SharedLibraryRequired {
                package: descriptor.display_name.clone(),
                attempts,
            });
        }
        if self.config.mandatory {
            return Err(ConfigureError::NotFound {
                package: descriptor.display_name.clone(),
                key: descriptor.key.clone(),
                attempts,
            });
        }
        Ok(Verdict::NotFound(attempts))
    }

    fn intent_failed(
        &self,
        descriptor: &PackageDescriptor,
        pending: &PendingIntent,
        attempts: &Attempts,
    ) -> ConfigureResult<()> {
        match self.config.override_policy {
            OverridePolicy::FailFast => Err(ConfigureError::OverrideUnusable {
                package: descriptor.display_name.clone(),
                option: pending.intent.option.clone(),
                value: pending.intent.value.clone(),
                attempts: attempts.clone(),
            }),
            OverridePolicy::FallThrough => {
                warn!(
                    package = %descriptor.key,
                    option = %pending.intent.option,
                    value = %pending.intent.value,
                    "Requested installation does not work, searching elsewhere"
                );
                Ok(())
            }
        }
    }
}

const fn is_intent_tier(tier: Tier) -> bool {
    matches!(tier, Tier::UserOverride | Tier::UserRoot)
}

/// Highest version first; ties prefer shared libraries, then earlier candidates.
fn best(successes: Vec<ProbeResult>) -> Option<ProbeResult> {
    successes
        .into_iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| {
            a.version()
                .cmp(&b.version())
                .then_with(|| shared(a).cmp(&shared(b)))
                .then_with(|| ib.cmp(ia))
        })
        .map(|(_, result)| result)
}

fn shared(result: &ProbeResult) -> bool {
    result.resolved().is_some_and(|r| r.shared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IncludeGroup, LibraryGroup, ProbeFailure, ResolvedInstall, Version};
    use std::cell::Cell;

    fn descriptor() -> PackageDescriptor {
        PackageDescriptor {
            key: "mpi".into(),
            display_name: "MPI".into(),
            ..Default::default()
        }
    }

    fn candidates(tiers: &[Tier]) -> Vec<ConfigureResult<Candidate>> {
        tiers
            .iter()
            .enumerate()
            .map(|(i, tier)| {
                let candidate = Candidate::new(format!("candidate {}", i + 1), *tier, vec![], vec![]);
                Ok(if matches!(tier, Tier::UserOverride | Tier::UserRoot) {
                    candidate.with_intent("with-mpi-dir", "/home/u/mpi")
                } else {
                    candidate
                })
            })
            .collect()
    }

    fn works(candidate: &Candidate, version: Option<&str>, shared: bool) -> ProbeResult {
        ProbeResult::success(
            candidate.clone(),
            ResolvedInstall {
                libraries: LibraryGroup::default(),
                includes: IncludeGroup::default(),
                version: version.and_then(Version::parse),
                shared,
            },
        )
    }

    fn fails(candidate: &Candidate) -> ProbeResult {
        ProbeResult::failure(
            candidate.clone(),
            ProbeFailure::MissingSymbol {
                symbol: "MPI_Init".into(),
                libraries: "[mpich]".into(),
            },
        )
    }

    #[test]
    fn test_first_success_stops_probing() {
        let probes = Cell::new(0);
        let selector = Selector::new(SelectorConfig::default());
        let verdict = selector
            .select(&descriptor(), candidates(&[Tier::WellKnown; 6]), |c| {
                probes.set(probes.get() + 1);
                Ok(if probes.get() == 4 { works(c, None, false) } else { fails(c) })
            })
            .unwrap();

        match verdict {
            Verdict::Selected { result, attempts } => {
                assert_eq!(result.candidate().name(), "candidate 4");
                assert_eq!(attempts.len(), 3);
            }
            Verdict::NotFound(_) => panic!("expected a selection"),
        }
        assert_eq!(probes.get(), 4);
    }

    #[test]
    fn test_alternatives_pick_highest_version() {
        let config = SelectorConfig {
            policy: SelectionPolicy::BestOfAll,
            ..Default::default()
        };
        let verdict = Selector::new(config)
            .select(&descriptor(), candidates(&[Tier::WellKnown; 6]), |c| {
                Ok(match c.name() {
                    "candidate 2" => works(c, Some("1.0"), true),
                    "candidate 5" => works(c, Some("2.0"), false),
                    _ => fails(c),
                })
            })
            .unwrap();
        let Verdict::Selected { result, .. } = verdict else {
            panic!("expected a selection");
        };
        assert_eq!(result.candidate().name(), "candidate 5");
    }

    #[test]
    fn test_alternatives_ties_prefer_shared_then_order() {
        let config = SelectorConfig {
            policy: SelectionPolicy::BestOfAll,
            ..Default::default()
        };
        let pick = |shared_index: Option<&str>| {
            let verdict = Selector::new(config)
                .select(&descriptor(), candidates(&[Tier::WellKnown; 3]), |c| {
                    Ok(works(c, Some("1.2"), Some(c.name()) == shared_index))
                })
                .unwrap();
            match verdict {
                Verdict::Selected { result, .. } => result.candidate().name().to_string(),
                Verdict::NotFound(_) => panic!("expected a selection"),
            }
        };
        assert_eq!(pick(Some("candidate 3")), "candidate 3");
        assert_eq!(pick(None), "candidate 1");
    }

    #[test]
    fn test_failed_override_never_falls_through() {
        let probes = Cell::new(0);
        let err = Selector::new(SelectorConfig::default())
            .select(
                &descriptor(),
                candidates(&[Tier::UserRoot, Tier::UserRoot, Tier::WellKnown]),
                |c| {
                    probes.set(probes.get() + 1);
                    Ok(if c.tier() == Tier::WellKnown { works(c, None, true) } else { fails(c) })
                },
            )
            .unwrap_err();

        match err {
            ConfigureError::OverrideUnusable { option, value, attempts, .. } => {
                assert_eq!(option, "with-mpi-dir");
                assert_eq!(value, "/home/u/mpi");
                assert_eq!(attempts.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(probes.get(), 2);
    }

    #[test]
    fn test_fall_through_policy_continues() {
        let config = SelectorConfig {
            override_policy: OverridePolicy::FallThrough,
            ..Default::default()
        };
        let verdict = Selector::new(config)
            .select(&descriptor(), candidates(&[Tier::UserRoot, Tier::WellKnown]), |c| {
                Ok(if c.tier() == Tier::WellKnown { works(c, None, true) } else { fails(c) })
            })
            .unwrap();
        assert!(matches!(verdict, Verdict::Selected { .. }));
    }

    #[test]
    fn test_override_that_works_ends_the_search_with_alternatives() {
        let config = SelectorConfig {
            policy: SelectionPolicy::BestOfAll,
            ..Default::default()
        };
        let probes = Cell::new(0);
        let verdict = Selector::new(config)
            .select(
                &descriptor(),
                candidates(&[Tier::UserRoot, Tier::UserRoot, Tier::WellKnown]),
                |c| {
                    probes.set(probes.get() + 1);
                    Ok(works(c, Some(if c.tier() == Tier::WellKnown { "9.0" } else { "1.0" }), true))
                },
            )
            .unwrap();
        let Verdict::Selected { result, .. } = verdict else {
            panic!("expected a selection");
        };
        assert_eq!(result.candidate().tier(), Tier::UserRoot);
        assert_eq!(probes.get(), 2);
    }

    #[test]
    fn test_shared_required() {
        let config = SelectorConfig {
            require_shared: true,
            ..Default::default()
        };
        let err = Selector::new(config)
            .select(&descriptor(), candidates(&[Tier::WellKnown; 2]), |c| Ok(works(c, None, false)))
            .unwrap_err();
        assert!(matches!(err, ConfigureError::SharedLibraryRequired { .. }));

        let verdict = Selector::new(config)
            .select(&descriptor(), candidates(&[Tier::WellKnown; 2]), |c| {
                Ok(works(c, None, c.name() == "candidate 2"))
            })
            .unwrap();
        let Verdict::Selected { result, attempts } = verdict else {
            panic!("expected a selection");
        };
        assert_eq!(result.candidate().name(), "candidate 2");
        assert_eq!(attempts.len(), 1);
    }

    #[test]
    fn test_mandatory_not_found_lists_attempts() {
        let config = SelectorConfig {
            mandatory: true,
            ..Default::default()
        };
        let err = Selector::new(config)
            .select(&descriptor(), candidates(&[Tier::Environment, Tier::WellKnown]), |c| Ok(fails(c)))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("candidate 1"));
        assert!(message.contains("candidate 2"));
    }

    #[test]
    fn test_optional_not_found_is_a_value() {
        let verdict = Selector::new(SelectorConfig::default())
            .select(&descriptor(), candidates(&[Tier::WellKnown]), |c| Ok(fails(c)))
            .unwrap();
        assert!(matches!(verdict, Verdict::NotFound(attempts) if attempts.len() == 1));
    }

    #[test]
    fn test_generator_error_aborts() {
        let items = vec![Err(ConfigureError::InvalidPackageDirectory("/x".into()))];
        let err = Selector::new(SelectorConfig::default())
            .select(&descriptor(), items, |c| Ok(fails(c)))
            .unwrap_err();
        assert!(matches!(err, ConfigureError::InvalidPackageDirectory(_)));
    }
}
