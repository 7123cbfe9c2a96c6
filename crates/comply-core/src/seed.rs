//! Bundled reference policies and the loader that installs them.
//!
//! The reference set is seed data, not part of the request-handling contract:
//! `install` is invoked once at initialization or on demand through the
//! orchestrator's load-defaults operation.

use anyhow::Result;
use chrono::Utc;

use crate::storage::{MetadataStore, VectorIndexStore};
use crate::types::{Industry, Policy};

struct ReferencePolicy {
    id: &'static str,
    title: &'static str,
    industry: Industry,
    content: &'static str,
    rules: &'static [&'static str],
}

const REFERENCE_POLICIES: &[ReferencePolicy] = &[
    ReferencePolicy {
        id: "pol-mfg-001",
        title: "Manufacturing Safety Protocols (OSHA)",
        industry: Industry::Manufacturing,
        content: "MANUFACTURING SITE SAFETY STANDARD v4.2\n\n\
1. PERSONAL PROTECTIVE EQUIPMENT (PPE)\n\
All personnel entering the production floor (Zone A & B) must wear:\n\
- ANSI Z89.1 compliant industrial hard hats.\n\
- Steel-toed safety boots.\n\
- High-visibility vests (Class 2).\n\
- Safety glasses with side shields.\n\n\
2. MACHINERY OPERATION\n\
- Only certified operators may use forklifts.\n\
- Lockout/Tagout (LOTO) procedures must be followed during maintenance.\n\
- Machine guards must never be bypassed.\n\n\
3. HAZARD REPORTING\n\
- Any oil spills must be cleaned within 15 minutes.\n\
- Blocked fire exits result in immediate suspension.",
        rules: &[
            "Hard hats and steel-toed boots are mandatory in production zones.",
            "High-visibility vests are required at all times.",
            "Only certified staff can operate forklifts.",
            "LOTO procedures apply to all maintenance tasks.",
            "Fire exits must remain unobstructed.",
        ],
    },
    ReferencePolicy {
        id: "pol-health-002",
        title: "Hospital Infection Control (HIPAA/JCI)",
        industry: Industry::Healthcare,
        content: "CLINICAL HYGIENE & PATIENT SAFETY\n\n\
1. STERILE FIELD\n\
- Staff must perform surgical hand scrub for 3 minutes before procedures.\n\
- Sterile gloves and gowns are required for all invasive actions.\n\
- Unattended sterile fields are considered contaminated.\n\n\
2. MEDICATION HANDLING\n\
- Triple-check verification (Patient ID, Drug, Dosage) is mandatory.\n\
- Narcotics cabinet must be double-locked.\n\n\
3. WASTE DISPOSAL\n\
- Sharps must go immediately into red biohazard bins.\n\
- Bins must be sealed when 3/4 full.",
        rules: &[
            "Perform 3-minute surgical scrub before procedures.",
            "Sterile gloves/gowns mandatory for invasive tasks.",
            "Verify Patient ID, Drug, and Dosage (Triple-Check).",
            "Sharps must be disposed of in red biohazard bins immediately.",
            "Narcotics must be kept double-locked.",
        ],
    },
    ReferencePolicy {
        id: "pol-fin-003",
        title: "Global AML & KYC Compliance",
        industry: Industry::Finance,
        content: "ANTI-MONEY LAUNDERING (AML) & KYC POLICY\n\n\
1. CUSTOMER IDENTIFICATION\n\
- Government-issued photo ID required for all new accounts.\n\
- Ultimate Beneficial Owner (UBO) must be identified for corporate accounts.\n\n\
2. TRANSACTION MONITORING\n\
- Cash transactions over $10,000 must be reported (CTR).\n\
- International transfers to high-risk jurisdictions require Enhanced Due Diligence (EDD).\n\
- Structuring deposits to avoid thresholds is prohibited.",
        rules: &[
            "Photo ID required for all new account openings.",
            "Identify UBO for all corporate accounts.",
            "Report cash transactions exceeding $10,000.",
            "Perform EDD for high-risk jurisdiction transfers.",
            "Flag potential structuring of deposits.",
        ],
    },
    ReferencePolicy {
        id: "pol-retail-004",
        title: "Food Safety & Store Hygiene",
        industry: Industry::Retail,
        content: "RETAIL FOOD SAFETY SOP\n\n\
1. TEMPERATURE CONTROL\n\
- Refrigeration units must be maintained between 1\u{b0}C and 4\u{b0}C.\n\
- Freezer units must be below -18\u{b0}C.\n\
- Temperature logs must be updated every 4 hours.\n\n\
2. STAFF HYGIENE\n\
- Hairnets and clean aprons are mandatory in food prep areas.\n\
- Hands must be washed every 30 minutes.\n\
- No jewelry allowed on hands/wrists.",
        rules: &[
            "Fridge temp must be 1\u{b0}C - 4\u{b0}C.",
            "Freezer temp must be below -18\u{b0}C.",
            "Update temperature logs every 4 hours.",
            "Hairnets and aprons mandatory in prep areas.",
            "No jewelry allowed; wash hands every 30 mins.",
        ],
    },
    ReferencePolicy {
        id: "pol-log-005",
        title: "Warehouse & Dock Loading Safety",
        industry: Industry::Logistics,
        content: "LOGISTICS DOCK SAFETY PROTOCOLS\n\n\
1. VEHICLE DOCKING\n\
- Wheel chocks must be set before loading begins.\n\
- Drivers must wait in the designated safe zone, not in the cab.\n\
- Trailer jack stands required for uncoupled trailers.\n\n\
2. LOAD SECURING\n\
- Loads must be shrink-wrapped and strapped.\n\
- Heavier pallets must be placed at the bottom.",
        rules: &[
            "Wheel chocks mandatory before loading.",
            "Drivers must exit cab to safe zone.",
            "Jack stands required for uncoupled trailers.",
            "All loads must be shrink-wrapped and strapped.",
        ],
    },
    ReferencePolicy {
        id: "pol-cons-006",
        title: "Construction Site Safety & Fall Protection",
        industry: Industry::Construction,
        content: "CONSTRUCTION SAFETY & FALL PROTECTION STANDARD\n\n\
1. FALL PROTECTION\n\
- Fall protection (harness/railings) required for any work above 6 feet.\n\
- All floor holes must be covered and labeled 'HOLE'.\n\n\
2. SCAFFOLDING\n\
- Scaffolds must be inspected daily by a competent person.\n\
- Wheels must be locked when in use.\n\
- No debris accumulation allowed on platforms.\n\n\
3. PERSONAL PROTECTIVE EQUIPMENT\n\
- Hard hats required at all times.\n\
- Safety glasses required when cutting/grinding.",
        rules: &[
            "Fall protection mandatory for work above 6 feet.",
            "Floor holes must be covered and labeled.",
            "Daily scaffold inspection by competent person required.",
            "Scaffold wheels must be locked during use.",
            "Hard hats and safety glasses required.",
        ],
    },
    ReferencePolicy {
        id: "pol-tech-007",
        title: "IT Security & Data Protection (ISO 27001)",
        industry: Industry::Technology,
        content: "INFORMATION SECURITY POLICY\n\n\
1. ACCESS CONTROL\n\
- Multi-Factor Authentication (MFA) required for all internal systems.\n\
- Passwords must be 12+ characters and rotated every 90 days.\n\
- Workstations must lock automatically after 5 minutes of inactivity.\n\n\
2. DATA PROTECTION\n\
- Customer data must be encrypted at rest (AES-256) and in transit (TLS 1.2+).\n\
- No sensitive data allowed on personal USB drives.\n\n\
3. INCIDENT RESPONSE\n\
- Suspected breaches must be reported to SecOps within 1 hour.",
        rules: &[
            "MFA required for all system access.",
            "Passwords: 12+ chars, 90-day rotation.",
            "Workstations auto-lock after 5 mins.",
            "Data must be encrypted at rest and in transit.",
            "Report breaches to SecOps within 1 hour.",
        ],
    },
    ReferencePolicy {
        id: "pol-energy-008",
        title: "Hazardous Area & Hot Work Standards",
        industry: Industry::Energy,
        content: "ENERGY SECTOR SAFETY PROTOCOLS\n\n\
1. HOT WORK PERMITS\n\
- A valid Hot Work Permit is required for welding/cutting in restricted zones.\n\
- Fire watch must remain on station for 30 minutes post-work.\n\n\
2. HAZARDOUS ATMOSPHERES\n\
- Gas testing required before entering confined spaces (O2, LEL, H2S).\n\
- Personal H2S monitors required in Zone 1.\n\n\
3. PPE STANDARDS\n\
- Flame Resistant Clothing (FRC) required in all process areas.\n\
- Hearing protection required in areas >85dB.",
        rules: &[
            "Hot Work Permit required for welding/cutting.",
            "Fire watch required for 30 mins post-work.",
            "Gas testing mandatory for confined spaces.",
            "Personal H2S monitors required in Zone 1.",
            "FRC clothing mandatory in process areas.",
        ],
    },
];

/// The bundled reference policies, already marked indexed.
pub fn reference_policies() -> Vec<Policy> {
    REFERENCE_POLICIES
        .iter()
        .map(|r| Policy {
            id: r.id.to_string(),
            title: r.title.to_string(),
            content: r.content.to_string(),
            rules: r.rules.iter().map(|s| s.to_string()).collect(),
            last_updated: Utc::now(),
            industry: Some(r.industry),
            indexed: true,
        })
        .collect()
}

/// Upsert every reference policy into the metadata store and register it in
/// the vector index. Returns how many policies were installed.
pub async fn install(
    metadata: &dyn MetadataStore,
    vectors: &dyn VectorIndexStore,
) -> Result<usize> {
    let policies = reference_policies();
    for policy in &policies {
        metadata.save(policy).await?;
        vectors.index_policy(&policy.id, &policy.content).await?;
    }
    tracing::info!(count = policies.len(), "reference policies installed");
    Ok(policies.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStores;

    #[test]
    fn reference_set_is_complete_and_indexed() {
        let policies = reference_policies();
        assert_eq!(policies.len(), 8);
        for policy in &policies {
            assert!(policy.indexed);
            assert!(!policy.rules.is_empty());
            assert!(!policy.content.is_empty());
            assert!(policy.industry.is_some());
        }
    }

    #[tokio::test]
    async fn install_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let stores = LocalStores::open(dir.path()).await.unwrap();

        install(stores.metadata.as_ref(), stores.vectors.as_ref())
            .await
            .unwrap();
        install(stores.metadata.as_ref(), stores.vectors.as_ref())
            .await
            .unwrap();

        assert_eq!(stores.metadata.row_count(), 8);
        assert!(stores.vectors.is_indexed("pol-mfg-001"));
    }
}
