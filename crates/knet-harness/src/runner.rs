//! Scenario runner: executes a [`FixtureSet`] against a fresh
//! `knet_core::Handle` per case, mirroring
//! `original_source/tests/knet_test.c`'s per-test handle setup.

use knet_core::{Handle, HandleConfig};

use crate::fixtures::{FixtureCase, FixtureSet};
use crate::verify::VerificationResult;

pub struct TestRunner {
    pub campaign: String,
}

impl TestRunner {
    #[must_use]
    pub fn new(campaign: impl Into<String>) -> Self {
        Self {
            campaign: campaign.into(),
        }
    }

    #[must_use]
    pub fn run(&self, fixture_set: &FixtureSet) -> Vec<VerificationResult> {
        fixture_set
            .cases
            .iter()
            .map(|case| self.run_case(case))
            .collect()
    }

    fn run_case(&self, case: &FixtureCase) -> VerificationResult {
        let handle = Handle::new(HandleConfig {
            node_id: 1,
            handle_id: 1,
            ..Default::default()
        });

        let cfg = knet_crypto_abi::CryptoConfig {
            crypto_model: case.crypto_model.clone(),
            crypto_cipher_type: case.crypto_cipher_type.clone(),
            crypto_hash_type: case.crypto_hash_type.clone(),
            private_key: case.private_key.clone(),
        };

        match handle.handle_crypto_set_config(&cfg, 1) {
            Ok(()) => {
                if !case.expect_install_ok {
                    return VerificationResult {
                        case_name: case.name.clone(),
                        spec_section: case.spec_section.clone(),
                        passed: false,
                        message: "install unexpectedly succeeded".into(),
                    };
                }
            }
            Err(e) => {
                return VerificationResult {
                    case_name: case.name.clone(),
                    spec_section: case.spec_section.clone(),
                    passed: !case.expect_install_ok,
                    message: format!("install failed: {e}"),
                };
            }
        }

        let ciphertext = match handle.send(&case.plaintext) {
            Ok(c) => c,
            Err(e) => {
                return VerificationResult {
                    case_name: case.name.clone(),
                    spec_section: case.spec_section.clone(),
                    passed: false,
                    message: format!("send failed: {e}"),
                };
            }
        };

        match handle.recv(&ciphertext) {
            Ok(outcome) if outcome.plaintext == case.plaintext => VerificationResult {
                case_name: case.name.clone(),
                spec_section: case.spec_section.clone(),
                passed: true,
                message: "round trip matched".into(),
            },
            Ok(_) => VerificationResult {
                case_name: case.name.clone(),
                spec_section: case.spec_section.clone(),
                passed: false,
                message: "round trip mismatch".into(),
            },
            Err(e) => VerificationResult {
                case_name: case.name.clone(),
                spec_section: case.spec_section.clone(),
                passed: false,
                message: format!("recv failed: {e}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_fixtures_all_pass() {
        let runner = TestRunner::new("smoke");
        let results = runner.run(&FixtureSet::built_in());
        for r in &results {
            assert!(r.passed, "{}: {}", r.case_name, r.message);
        }
    }
}
