//! Food items offered through a donation.
//!
//! A [`FoodItem`] is owned by exactly one donation; it is created from a
//! [`FoodItemDraft`] in the same store call as its donation and removed with
//! it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::DonationValidationError;

/// Maximum length of free-text food item fields.
pub const FOOD_TEXT_MAX: usize = 500;
/// Maximum number of allergen entries per item.
pub const ALLERGENS_MAX: usize = 32;

/// Identifier of a food item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodItemId(Uuid);

impl FoodItemId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for FoodItemId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for FoodItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

macro_rules! lowercase_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
        field = $field:literal;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DonationValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(DonationValidationError::UnknownValue {
                        field: $field,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

lowercase_enum! {
    /// Broad food category used for filtering and handling advice.
    pub enum FoodType {
        Cooked => "cooked",
        Packaged => "packaged",
        Produce => "produce",
        Dairy => "dairy",
        Grains => "grains",
        Other => "other",
    }
    field = "foodType";
}

lowercase_enum! {
    /// Unit of [`Quantity::amount`].
    pub enum QuantityUnit {
        Kg => "kg",
        Items => "items",
        Servings => "servings",
        Liters => "liters",
    }
    field = "quantityUnit";
}

/// Positive amount with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Quantity {
    #[schema(example = 12.5)]
    amount: f64,
    unit: QuantityUnit,
}

impl Quantity {
    pub fn new(amount: f64, unit: QuantityUnit) -> Result<Self, DonationValidationError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(DonationValidationError::NonPositiveQuantity);
        }
        Ok(Self { amount, unit })
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn unit(&self) -> QuantityUnit {
        self.unit
    }
}

/// Per-serving nutrition facts. Every value is optional and non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proteins: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbohydrates: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fats: Option<f64>,
}

impl NutritionFacts {
    fn validate(self) -> Result<Self, DonationValidationError> {
        let fields = [
            ("nutritionalInfo.calories", self.calories),
            ("nutritionalInfo.proteins", self.proteins),
            ("nutritionalInfo.carbohydrates", self.carbohydrates),
            ("nutritionalInfo.fats", self.fats),
        ];
        for (field, value) in fields {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(DonationValidationError::NegativeValue { field });
            }
        }
        Ok(self)
    }
}

/// Unvalidated food item input as received from a donor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoodItemDraft {
    pub name: Option<String>,
    pub food_type: Option<FoodType>,
    pub amount: Option<f64>,
    pub unit: Option<QuantityUnit>,
    pub expires_at: Option<DateTime<Utc>>,
    pub prepared_at: Option<DateTime<Utc>>,
    pub allergens: Vec<String>,
    pub nutrition: Option<NutritionFacts>,
    pub storage_instructions: Option<String>,
    pub packaging_details: Option<String>,
}

/// Food offered through a donation.
///
/// ## Invariants
/// - `name` is non-empty once trimmed.
/// - `quantity.amount() > 0`.
/// - `expires_at` was in the future when the item was created.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodItem {
    pub id: FoodItemId,
    pub name: String,
    pub food_type: FoodType,
    pub quantity: Quantity,
    pub expires_at: DateTime<Utc>,
    pub prepared_at: Option<DateTime<Utc>>,
    pub allergens: Vec<String>,
    pub nutrition: Option<NutritionFacts>,
    pub storage_instructions: Option<String>,
    pub packaging_details: Option<String>,
}

pub(crate) fn required_text(
    field: &'static str,
    value: Option<String>,
) -> Result<String, DonationValidationError> {
    let value = value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
        .ok_or(DonationValidationError::MissingField { field })?;
    bounded(field, value)
}

pub(crate) fn optional_text(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<String>, DonationValidationError> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
        .map(|trimmed| bounded(field, trimmed))
        .transpose()
}

fn bounded(field: &'static str, value: String) -> Result<String, DonationValidationError> {
    if value.chars().count() > FOOD_TEXT_MAX {
        return Err(DonationValidationError::TextTooLong {
            field,
            max: FOOD_TEXT_MAX,
        });
    }
    Ok(value)
}

impl FoodItem {
    /// Validate a draft at time `now`.
    ///
    /// A missing food type defaults to [`FoodType::Other`] and a missing unit
    /// to [`QuantityUnit::Items`].
    pub fn from_draft(
        draft: FoodItemDraft,
        id: FoodItemId,
        now: DateTime<Utc>,
    ) -> Result<Self, DonationValidationError> {
        let FoodItemDraft {
            name,
            food_type,
            amount,
            unit,
            expires_at,
            prepared_at,
            allergens,
            nutrition,
            storage_instructions,
            packaging_details,
        } = draft;

        let name = required_text("foodName", name)?;
        let amount = amount.ok_or(DonationValidationError::MissingField { field: "quantity" })?;
        let quantity = Quantity::new(amount, unit.unwrap_or(QuantityUnit::Items))?;
        let expires_at =
            expires_at.ok_or(DonationValidationError::MissingField { field: "expiryDate" })?;
        if expires_at <= now {
            return Err(DonationValidationError::ExpiryNotInFuture);
        }
        if prepared_at.is_some_and(|prepared| prepared > now) {
            return Err(DonationValidationError::PreparedInFuture);
        }
        if allergens.len() > ALLERGENS_MAX {
            return Err(DonationValidationError::TooManyAllergens { max: ALLERGENS_MAX });
        }
        let allergens = allergens
            .into_iter()
            .map(|entry| optional_text("allergenInfo", Some(entry)))
            .filter_map(Result::transpose)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            name,
            food_type: food_type.unwrap_or(FoodType::Other),
            quantity,
            expires_at,
            prepared_at,
            allergens,
            nutrition: nutrition.map(NutritionFacts::validate).transpose()?,
            storage_instructions: optional_text("storageInstructions", storage_instructions)?,
            packaging_details: optional_text("packagingDetails", packaging_details)?,
        })
    }

    /// Whether the item is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
