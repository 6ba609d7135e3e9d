use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pipeline stage a lead sits in. Declaration order is board column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    New,
    Contacted,
    ProposalSent,
    Negotiation,
    Won,
    Lost,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Self::New,
        Self::Contacted,
        Self::ProposalSent,
        Self::Negotiation,
        Self::Won,
        Self::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::ProposalSent => "proposalsent",
            Self::Negotiation => "negotiation",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    /// Column heading: the wire name with its first letter upper-cased.
    pub fn title(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Entering this stage needs a product/quantity confirmation before commit.
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, Self::Won)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "proposalsent" => Ok(Self::ProposalSent),
            "negotiation" => Ok(Self::Negotiation),
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            _ => Err(format!(
                "Invalid stage '{}'. Valid values: new, contacted, proposalsent, negotiation, won, lost",
                s
            )),
        }
    }
}

/// Opaque backend identity of a lead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LeadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepRef {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

/// Product badge shown on a lead card once the lead has been won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTag {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(rename = "_id")]
    pub id: LeadId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<RepRef>,
    #[serde(default)]
    pub products: Vec<ProductTag>,
}

impl Lead {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: LeadId::new(id),
            name: name.into(),
            company: String::new(),
            phone: String::new(),
            email: None,
            assigned_to: None,
            products: Vec::new(),
        }
    }
}

/// Stage-keyed lead lists as returned by the backend, before they are loaded.
pub type BoardSnapshot = BTreeMap<Stage, Vec<Lead>>;

/// A position on the board: a column and an index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub stage: Stage,
    pub index: usize,
}

impl Slot {
    pub fn new(stage: Stage, index: usize) -> Self {
        Self { stage, index }
    }
}

/// Raw end-of-drag event from the rendering surface.
/// `destination` is `None` when the card was dropped outside every column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEnd {
    pub lead_id: LeadId,
    pub source: Slot,
    pub destination: Option<Slot>,
}

/// A resolved move, applied to the board and carried until commit or rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub lead_id: LeadId,
    pub source: Slot,
    pub dest: Slot,
}

/// Stage/position update for a non-won destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageChange {
    #[serde(skip)]
    pub lead_id: LeadId,
    #[serde(rename = "status")]
    pub stage: Stage,
    pub index: usize,
}

/// One confirmed product line of a won confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedProduct {
    #[serde(rename = "id")]
    pub product_id: String,
    #[serde(rename = "product")]
    pub product_label: String,
    pub quantity: u32,
}

impl ConfirmedProduct {
    pub fn new(product_id: impl Into<String>, product_label: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            product_label: product_label.into(),
            quantity,
        }
    }
}

/// Product/quantity detail collected before a lead may enter the won stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WonConfirmation {
    pub products: Vec<ConfirmedProduct>,
}

impl WonConfirmation {
    pub fn new(products: Vec<ConfirmedProduct>) -> Self {
        Self { products }
    }

    /// Check the confirmation is committable. Returns the user-facing reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.products.is_empty() {
            return Err("Select at least one product before confirming".to_string());
        }
        for (i, item) in self.products.iter().enumerate() {
            if item.product_id.trim().is_empty() {
                return Err(format!("Product line {} has no product selected", i + 1));
            }
            if item.quantity < 1 {
                return Err(format!(
                    "Quantity for '{}' must be at least 1",
                    if item.product_label.is_empty() {
                        &item.product_id
                    } else {
                        &item.product_label
                    }
                ));
            }
        }
        Ok(())
    }

    /// Badges recorded on the lead card after a successful commit.
    pub fn to_tags(&self) -> Vec<ProductTag> {
        self.products
            .iter()
            .map(|p| ProductTag {
                id: Some(p.product_id.clone()),
                name: p.product_label.clone(),
                quantity: Some(p.quantity),
            })
            .collect()
    }
}

/// Product catalog entry offered in the won confirmation dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_round_trips_wire_names() {
        for stage in Stage::ALL {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
        }
        assert_eq!("ProposalSent".parse::<Stage>().unwrap(), Stage::ProposalSent);
        assert!("closed".parse::<Stage>().is_err());
    }

    #[test]
    fn test_stage_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Stage::ProposalSent).unwrap();
        assert_eq!(json, "\"proposalsent\"");
        let stage: Stage = serde_json::from_str("\"won\"").unwrap();
        assert_eq!(stage, Stage::Won);
    }

    #[test]
    fn test_only_won_requires_confirmation() {
        let confirming: Vec<Stage> = Stage::ALL
            .into_iter()
            .filter(|s| s.requires_confirmation())
            .collect();
        assert_eq!(confirming, vec![Stage::Won]);
    }

    #[test]
    fn test_stage_title() {
        assert_eq!(Stage::New.title(), "New");
        assert_eq!(Stage::ProposalSent.title(), "Proposalsent");
    }

    #[test]
    fn test_lead_deserializes_backend_shape() {
        let lead: Lead = serde_json::from_value(serde_json::json!({
            "_id": "65f0c1",
            "name": "ada",
            "company": "Analytical Engines",
            "phone": "555-0101",
            "assignedTo": {"_id": "rep1", "name": "Grace"},
            "products": [{"name": "Widget"}],
            "status": "new"
        }))
        .unwrap();
        assert_eq!(lead.id, LeadId::new("65f0c1"));
        assert_eq!(lead.assigned_to.unwrap().name, "Grace");
        assert_eq!(lead.products[0].name, "Widget");
    }

    #[test]
    fn test_lead_tolerates_missing_display_fields() {
        let lead: Lead = serde_json::from_value(serde_json::json!({"_id": "x"})).unwrap();
        assert_eq!(lead.name, "");
        assert!(lead.assigned_to.is_none());
        assert!(lead.products.is_empty());
    }

    #[test]
    fn test_stage_change_wire_body() {
        let change = StageChange {
            lead_id: LeadId::new("L1"),
            stage: Stage::Negotiation,
            index: 2,
        };
        let body = serde_json::to_value(&change).unwrap();
        assert_eq!(body, serde_json::json!({"status": "negotiation", "index": 2}));
    }

    #[test]
    fn test_confirmed_product_wire_shape() {
        let item = ConfirmedProduct::new("p1", "Widget", 3);
        let body = serde_json::to_value(&item).unwrap();
        assert_eq!(body, serde_json::json!({"id": "p1", "product": "Widget", "quantity": 3}));
    }

    #[test]
    fn test_won_confirmation_requires_products() {
        let err = WonConfirmation::default().validate().unwrap_err();
        assert!(err.contains("at least one product"));
    }

    #[test]
    fn test_won_confirmation_rejects_zero_quantity() {
        let confirmation = WonConfirmation::new(vec![
            ConfirmedProduct::new("p1", "Widget", 2),
            ConfirmedProduct::new("p2", "Gadget", 0),
        ]);
        let err = confirmation.validate().unwrap_err();
        assert!(err.contains("Gadget"));
    }

    #[test]
    fn test_won_confirmation_rejects_blank_product() {
        let confirmation = WonConfirmation::new(vec![ConfirmedProduct::new("  ", "", 1)]);
        assert!(confirmation.validate().is_err());
    }

    #[test]
    fn test_won_confirmation_accepts_valid_lines() {
        let confirmation = WonConfirmation::new(vec![ConfirmedProduct::new("p1", "Widget", 1)]);
        assert!(confirmation.validate().is_ok());
        let tags = confirmation.to_tags();
        assert_eq!(tags[0].name, "Widget");
        assert_eq!(tags[0].quantity, Some(1));
    }
}
