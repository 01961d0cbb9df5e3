use crate::error::DataError;
use crate::filter::PriceRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::Path;

/// Columns every listings file must carry. Any other column is ignored.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "Country",
    "Property_type",
    "Room_type",
    "Host_name",
    "Listing_Name",
    "Price",
    "Availability_365",
    "Review_scores",
];

/// One rental listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Property_type")]
    pub property_type: String,
    #[serde(rename = "Room_type")]
    pub room_type: String,
    #[serde(rename = "Host_name")]
    pub host_name: String,
    #[serde(rename = "Listing_Name")]
    pub listing_name: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Availability_365")]
    pub availability_365: f64,
    /// Empty cells are missing scores, not zero
    #[serde(rename = "Review_scores")]
    pub review_scores: Option<f64>,
}

/// Categorical columns a view can group by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryField {
    Country,
    PropertyType,
    RoomType,
    HostName,
    ListingName,
}

impl CategoryField {
    pub fn column(self) -> &'static str {
        match self {
            CategoryField::Country => "Country",
            CategoryField::PropertyType => "Property_type",
            CategoryField::RoomType => "Room_type",
            CategoryField::HostName => "Host_name",
            CategoryField::ListingName => "Listing_Name",
        }
    }

    pub fn value(self, listing: &Listing) -> &str {
        match self {
            CategoryField::Country => &listing.country,
            CategoryField::PropertyType => &listing.property_type,
            CategoryField::RoomType => &listing.room_type,
            CategoryField::HostName => &listing.host_name,
            CategoryField::ListingName => &listing.listing_name,
        }
    }
}

/// Numeric columns a view can reduce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    Price,
    Availability,
    ReviewScores,
}

impl NumericField {
    pub fn column(self) -> &'static str {
        match self {
            NumericField::Price => "Price",
            NumericField::Availability => "Availability_365",
            NumericField::ReviewScores => "Review_scores",
        }
    }

    pub fn value(self, listing: &Listing) -> Option<f64> {
        match self {
            NumericField::Price => Some(listing.price),
            NumericField::Availability => Some(listing.availability_365),
            NumericField::ReviewScores => listing.review_scores,
        }
    }
}

/// The full listing set. Loaded once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    listings: Vec<Listing>,
}

impl Dataset {
    pub fn from_listings(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    /// Load a listings CSV from disk
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let reader = csv::Reader::from_path(path).map_err(|source| DataError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv(reader)
    }

    /// Load a listings CSV from any reader (header row required)
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, DataError> {
        let headers = reader.headers().map_err(DataError::Header)?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(DataError::MissingColumn(column.to_string()));
            }
        }

        let mut listings = Vec::new();
        for (idx, record) in reader.deserialize::<Listing>().enumerate() {
            let listing = record.map_err(|source| DataError::Record { row: idx + 1, source })?;
            listings.push(listing);
        }

        if listings.is_empty() {
            return Err(DataError::Empty);
        }

        log::debug!("Parsed {} listings", listings.len());
        Ok(Self { listings })
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Sorted distinct values of a categorical column
    pub fn distinct(&self, field: CategoryField) -> Vec<String> {
        self.listings
            .iter()
            .map(|l| field.value(l))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Lowest and highest price in the dataset
    pub fn price_bounds(&self) -> Option<PriceRange> {
        let mut prices = self.listings.iter().map(|l| l.price);
        let first = prices.next()?;
        let (min, max) = prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(PriceRange { min, max })
    }
}

/// Write listings as CSV using the dataset's column names.
/// The header is written even when there are no rows.
pub fn write_csv<'a, W, I>(writer: W, rows: I) -> anyhow::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Listing>,
{
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(REQUIRED_COLUMNS)?;

    let mut written = 0;
    for listing in rows {
        wtr.serialize(listing)?;
        written += 1;
    }
    wtr.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Country,Property_type,Room_type,Host_name,Listing_Name,Price,Availability_365,Review_scores,Extra
Spain,Apartment,Private room,Ana,Sunny flat,35,120,92,x
Portugal,House,Entire home/apt,Rui,Casa azul,80,300,,y
";

    #[test]
    fn test_from_reader_parses_rows_and_ignores_extra_columns() {
        let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        let first = &ds.listings()[0];
        assert_eq!(first.country, "Spain");
        assert_eq!(first.room_type, "Private room");
        assert_eq!(first.price, 35.0);
        assert_eq!(first.review_scores, Some(92.0));
        assert_eq!(ds.listings()[1].review_scores, None);
    }

    #[test]
    fn test_missing_column() {
        let csv = "Country,Room_type,Price\nSpain,Private room,10\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(ref c) if c == "Property_type"));
    }

    #[test]
    fn test_malformed_price_reports_row() {
        let csv = "\
Country,Property_type,Room_type,Host_name,Listing_Name,Price,Availability_365,Review_scores
Spain,Apartment,Private room,Ana,Flat,35,120,92
Spain,Apartment,Private room,Ana,Flat,cheap,120,92
";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Record { row: 2, .. }));
    }

    #[test]
    fn test_empty_dataset() {
        let csv = REQUIRED_COLUMNS.join(",") + "\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Empty));
    }

    #[test]
    fn test_distinct_and_price_bounds() {
        let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(ds.distinct(CategoryField::Country), vec!["Portugal", "Spain"]);
        let bounds = ds.price_bounds().unwrap();
        assert_eq!((bounds.min, bounds.max), (35.0, 80.0));
    }

    #[test]
    fn test_write_csv_round_trips_required_columns() {
        let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
        let mut out = Vec::new();
        let written = write_csv(&mut out, ds.listings()).unwrap();
        assert_eq!(written, 2);

        let reloaded = Dataset::from_reader(out.as_slice()).unwrap();
        assert_eq!(reloaded, ds);
    }

    #[test]
    fn test_write_csv_header_only_when_empty() {
        let mut out = Vec::new();
        write_csv(&mut out, std::iter::empty()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.trim_end(), REQUIRED_COLUMNS.join(","));
    }
}
