//! Auto-retrying assertions.
//!
//! `expect(&locator).to_contain_text("...")` polls until the predicate holds
//! or the action timeout elapses. Element predicates are strict: the locator
//! has to resolve to exactly one element. Text checks use normalised
//! substring containment.

use crate::driver::ElementState;
use crate::locator::{describe_matches, Locator};
use crate::page::Page;
use crate::result::{ProbeError, ProbeResult};
use crate::text::{contains_normalized, missing_fragments, truncate};
use crate::wait::{poll_until, Probe, WaitOptions};
use std::fmt;

const OBSERVATION_LIMIT: usize = 400;

/// Predicate evaluated against a locator's current matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Exactly one match, visible
    Visible,
    /// No visible match
    Hidden,
    /// Exactly one match, enabled
    Enabled,
    /// Exactly one match, checked
    Checked,
    /// Exactly one match whose text contains the fragment
    ContainsText(String),
    /// Exactly one match whose text contains every fragment
    ContainsAllTexts(Vec<String>),
    /// This many matches
    Count(usize),
}

impl Predicate {
    /// Evaluate against current matches; `Err` carries the observation
    pub fn evaluate(&self, matches: &[ElementState]) -> Result<(), String> {
        match self {
            Self::Hidden => {
                if matches.iter().any(|el| el.visible) {
                    Err(describe_matches(matches))
                } else {
                    Ok(())
                }
            }
            Self::Count(expected) => {
                if matches.len() == *expected {
                    Ok(())
                } else {
                    Err(format!("{} elements matched", matches.len()))
                }
            }
            single => {
                let [el] = matches else {
                    return Err(describe_matches(matches));
                };
                single.evaluate_one(el)
            }
        }
    }

    fn evaluate_one(&self, el: &ElementState) -> Result<(), String> {
        let ok = match self {
            Self::Visible => el.visible,
            Self::Enabled => el.enabled,
            Self::Checked => el.checked == Some(true),
            Self::ContainsText(fragment) => contains_normalized(&el.text, fragment),
            Self::ContainsAllTexts(fragments) => {
                let refs: Vec<&str> = fragments.iter().map(String::as_str).collect();
                let missing = missing_fragments(&el.text, &refs);
                if !missing.is_empty() {
                    return Err(format!(
                        "missing {:?} in \"{}\"",
                        missing,
                        truncate(&el.text, OBSERVATION_LIMIT)
                    ));
                }
                true
            }
            Self::Hidden | Self::Count(_) => true,
        };
        if ok {
            Ok(())
        } else {
            Err(match self {
                Self::ContainsText(_) => {
                    format!("\"{}\"", truncate(&el.text, OBSERVATION_LIMIT))
                }
                _ => el.summary(),
            })
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible => write!(f, "to be visible"),
            Self::Hidden => write!(f, "to be hidden"),
            Self::Enabled => write!(f, "to be enabled"),
            Self::Checked => write!(f, "to be checked"),
            Self::ContainsText(text) => write!(f, "to contain text \"{text}\""),
            Self::ContainsAllTexts(texts) => write!(f, "to contain all of {texts:?}"),
            Self::Count(n) => write!(f, "to have count {n}"),
        }
    }
}

/// Assertion builder for a locator
#[derive(Debug)]
pub struct Expect<'a> {
    locator: &'a Locator,
    wait: WaitOptions,
}

/// Start an assertion on a locator
#[must_use]
pub fn expect(locator: &Locator) -> Expect<'_> {
    Expect {
        locator,
        wait: *locator.wait_options(),
    }
}

impl Expect<'_> {
    /// Override the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.wait.timeout_ms = timeout_ms;
        self
    }

    /// Poll until `predicate` holds
    pub async fn to_satisfy(self, predicate: Predicate) -> ProbeResult<()> {
        let locator = self.locator;
        let check = &predicate;
        let outcome = poll_until(&self.wait, || async move {
            match locator.all().await {
                Ok(matches) => match check.evaluate(&matches) {
                    Ok(()) => Probe::Ready(()),
                    Err(observed) => Probe::Pending(observed),
                },
                Err(e) => Probe::Pending(format!("query failed: {e}")),
            }
        })
        .await;

        outcome.map_err(|timeout| ProbeError::AssertionTimeout {
            expectation: format!("{} {predicate}", locator.selector()),
            timeout_ms: self.wait.timeout_ms,
            last_observed: timeout
                .last
                .unwrap_or_else(|| "nothing observed".to_string()),
        })
    }

    /// Exactly one visible match
    pub async fn to_be_visible(self) -> ProbeResult<()> {
        self.to_satisfy(Predicate::Visible).await
    }

    /// No visible match
    pub async fn to_be_hidden(self) -> ProbeResult<()> {
        self.to_satisfy(Predicate::Hidden).await
    }

    /// Exactly one enabled match
    pub async fn to_be_enabled(self) -> ProbeResult<()> {
        self.to_satisfy(Predicate::Enabled).await
    }

    /// Exactly one checked match
    pub async fn to_be_checked(self) -> ProbeResult<()> {
        self.to_satisfy(Predicate::Checked).await
    }

    /// Text contains `fragment`
    pub async fn to_contain_text(self, fragment: &str) -> ProbeResult<()> {
        self.to_satisfy(Predicate::ContainsText(fragment.to_string()))
            .await
    }

    /// Text contains every fragment; a timeout names all missing ones
    pub async fn to_contain_all_texts(self, fragments: &[&str]) -> ProbeResult<()> {
        self.to_satisfy(Predicate::ContainsAllTexts(
            fragments.iter().map(ToString::to_string).collect(),
        ))
        .await
    }

    /// Exactly `count` matches
    pub async fn to_have_count(self, count: usize) -> ProbeResult<()> {
        self.to_satisfy(Predicate::Count(count)).await
    }
}

/// Poll until the page URL equals `expected` exactly
pub async fn expect_url(page: &Page, expected: &str, wait: &WaitOptions) -> ProbeResult<()> {
    let outcome = poll_until(wait, || async move {
        match page.url().await {
            Ok(url) if url == expected => Probe::Ready(()),
            Ok(url) => Probe::Pending(url),
            Err(e) => Probe::Pending(format!("url unavailable: {e}")),
        }
    })
    .await;

    outcome.map_err(|timeout| ProbeError::AssertionTimeout {
        expectation: format!("page URL to be {expected}"),
        timeout_ms: wait.timeout_ms,
        last_observed: timeout.last.unwrap_or_default(),
    })
}
