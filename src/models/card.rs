//! Card metadata.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Storage format of `Card::expire_date`.
pub const EXPIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Represents a card record from the database.
///
/// Cards are read-mostly here; only the top-up path writes them back.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Card {
    pub id: i32,

    /// Owner of the card
    pub user_id: i32,

    pub card_number: String,
    pub card_type: String,

    /// Expiry as stored, formatted `YYYY-MM-DD`
    pub expire_date: String,

    pub cvv: String,
    pub card_provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Parse the stored expiry date.
    pub fn parsed_expire_date(&self) -> Result<NaiveDate, chrono::ParseError> {
        NaiveDate::parse_from_str(&self.expire_date, EXPIRE_DATE_FORMAT)
    }
}

/// Full rewrite of a card's mutable fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCard {
    pub card_id: i32,
    pub user_id: i32,
    pub card_type: String,
    pub expire_date: NaiveDate,
    pub cvv: String,
    pub card_provider: String,
}

impl UpdateCard {
    /// Rewrite request carrying the card's current fields and the given expiry.
    pub fn from_card(card: &Card, expire_date: NaiveDate) -> Self {
        Self {
            card_id: card.id,
            user_id: card.user_id,
            card_type: card.card_type.clone(),
            expire_date,
            cvv: card.cvv.clone(),
            card_provider: card.card_provider.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(expire_date: &str) -> Card {
        Card {
            id: 1,
            user_id: 7,
            card_number: "4111111111111111".to_string(),
            card_type: "debit".to_string(),
            expire_date: expire_date.to_string(),
            cvv: "123".to_string(),
            card_provider: "visa".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn parses_stored_expiry() {
        let parsed = card("2030-12-31").parsed_expire_date().unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2030, 12, 31).unwrap());
    }

    #[test]
    fn rejects_malformed_expiry() {
        assert!(card("12/30").parsed_expire_date().is_err());
    }

    #[test]
    fn rewrite_keeps_card_fields() {
        let card = card("2030-12-31");
        let expiry = card.parsed_expire_date().unwrap();
        let update = UpdateCard::from_card(&card, expiry);

        assert_eq!(update.card_id, card.id);
        assert_eq!(update.user_id, card.user_id);
        assert_eq!(update.cvv, card.cvv);
        assert_eq!(update.expire_date, expiry);
    }
}
