use crate::data::{CategoryField, Dataset, Listing};
use crate::error::FilterError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive price interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Result<Self, FilterError> {
        for bound in [min, max] {
            if !bound.is_finite() {
                return Err(FilterError::NonFinitePrice(bound));
            }
        }
        if min > max {
            return Err(FilterError::InvertedPriceRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

/// Partial selection coming from CLI flags or a filter expression.
/// `None` leaves the facet at its current value; `Some(vec![])` selects nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOverrides {
    pub countries: Option<Vec<String>>,
    pub property_types: Option<Vec<String>>,
    pub room_types: Option<Vec<String>>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}

impl FilterOverrides {
    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: FilterOverrides) -> FilterOverrides {
        FilterOverrides {
            countries: other.countries.or(self.countries),
            property_types: other.property_types.or(self.property_types),
            room_types: other.room_types.or(self.room_types),
            price_min: other.price_min.or(self.price_min),
            price_max: other.price_max.or(self.price_max),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterOverrides::default()
    }
}

/// The conjunction of chosen countries, property types, room types and a
/// price interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSelection {
    pub countries: BTreeSet<String>,
    pub property_types: BTreeSet<String>,
    pub room_types: BTreeSet<String>,
    pub price: PriceRange,
}

impl FilterSelection {
    /// Selection with every facet value and the full price range chosen.
    /// Applying it returns the whole dataset.
    pub fn all(dataset: &Dataset) -> Self {
        Self {
            countries: dataset.distinct(CategoryField::Country).into_iter().collect(),
            property_types: dataset.distinct(CategoryField::PropertyType).into_iter().collect(),
            room_types: dataset.distinct(CategoryField::RoomType).into_iter().collect(),
            price: dataset
                .price_bounds()
                .unwrap_or(PriceRange { min: 0.0, max: 0.0 }),
        }
    }

    /// Apply overrides to this selection. Values absent from the dataset are
    /// kept (they simply match nothing) but reported.
    pub fn with_overrides(
        mut self,
        dataset: &Dataset,
        overrides: &FilterOverrides,
    ) -> Result<Self, FilterError> {
        if let Some(values) = &overrides.countries {
            self.countries = checked_set(dataset, CategoryField::Country, values);
        }
        if let Some(values) = &overrides.property_types {
            self.property_types = checked_set(dataset, CategoryField::PropertyType, values);
        }
        if let Some(values) = &overrides.room_types {
            self.room_types = checked_set(dataset, CategoryField::RoomType, values);
        }

        // Only two explicit bounds can be inverted; an inherited bound yields
        // to the explicit one, leaving a range that may match nothing.
        self.price = match (overrides.price_min, overrides.price_max) {
            (Some(min), Some(max)) => PriceRange::new(min, max)?,
            (Some(min), None) => PriceRange::new(min, self.price.max.max(min))?,
            (None, Some(max)) => PriceRange::new(self.price.min.min(max), max)?,
            (None, None) => self.price,
        };

        Ok(self)
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        self.countries.contains(&listing.country)
            && self.property_types.contains(&listing.property_type)
            && self.room_types.contains(&listing.room_type)
            && self.price.contains(listing.price)
    }

    /// Listings passing every predicate, in dataset order
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> Vec<&'a Listing> {
        dataset.listings().iter().filter(|l| self.matches(l)).collect()
    }
}

fn checked_set(dataset: &Dataset, field: CategoryField, values: &[String]) -> BTreeSet<String> {
    let known = dataset.distinct(field);
    for value in values {
        if known.binary_search(value).is_err() {
            log::warn!("{} '{}' does not occur in the dataset", field.column(), value);
        }
    }
    values.iter().cloned().collect()
}
