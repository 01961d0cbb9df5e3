//! Page composition: which charts each page shows and the view behind each.
//!
//! `build_page` is a pure function of the dataset and the selection; calling
//! it twice with the same inputs yields identical pages.

use crate::aggregate::{
    count_by, count_present_by, distribution_by, mean_by, AggregationView, DistributionView,
    SortOrder,
};
use crate::data::{CategoryField, Dataset, Listing, NumericField};
use crate::filter::{FilterSelection, PriceRange};
use crate::palette::ColorScale;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Home,
    Insights,
    Analysis,
}

impl Page {
    pub fn name(self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Insights => "insights",
            Page::Analysis => "analysis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    HorizontalBar,
    VerticalBar,
    Pie,
    Box,
    Choropleth,
    ScatterGeo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartData {
    Aggregate(AggregationView),
    Distribution(DistributionView),
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Aggregate(view) => view.is_empty(),
            ChartData::Distribution(view) => view.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChartData::Aggregate(view) => view.len(),
            ChartData::Distribution(view) => view.groups.len(),
        }
    }
}

/// One chart: what to draw and the table to draw it from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub id: &'static str,
    pub title: String,
    pub kind: ChartKind,
    pub scale: ColorScale,
    pub data: ChartData,
}

/// Dataset overview shown on the home page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub listings: usize,
    pub countries: Vec<String>,
    pub property_types: usize,
    pub room_types: Vec<String>,
    pub hosts: usize,
    pub price: Option<PriceRange>,
}

impl Summary {
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            listings: dataset.len(),
            countries: dataset.distinct(CategoryField::Country),
            property_types: dataset.distinct(CategoryField::PropertyType).len(),
            room_types: dataset.distinct(CategoryField::RoomType),
            hosts: dataset.distinct(CategoryField::HostName).len(),
            price: dataset.price_bounds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageViews {
    pub page: Page,
    pub total: usize,
    pub matched: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<FilterSelection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    pub charts: Vec<Chart>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Row limit for the top-N bar charts
    pub top_n: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self { top_n: 10 }
    }
}

/// Build every view a page needs from the dataset and a selection
pub fn build_page(
    dataset: &Dataset,
    selection: &FilterSelection,
    page: Page,
    options: &ViewOptions,
) -> PageViews {
    if page == Page::Home {
        return PageViews {
            page,
            total: dataset.len(),
            matched: dataset.len(),
            selection: None,
            summary: Some(Summary::of(dataset)),
            charts: Vec::new(),
        };
    }

    let rows = selection.apply(dataset);
    log::info!("{} of {} listings match the selection", rows.len(), dataset.len());

    let charts = match page {
        Page::Insights => insights_charts(&rows, options),
        Page::Analysis => analysis_charts(&rows),
        Page::Home => Vec::new(),
    };

    for chart in &charts {
        log::debug!("{}: {} rows", chart.id, chart.data.len());
    }

    PageViews {
        page,
        total: dataset.len(),
        matched: rows.len(),
        selection: Some(selection.clone()),
        summary: None,
        charts,
    }
}

fn aggregate_chart(
    id: &'static str,
    title: String,
    kind: ChartKind,
    scale: ColorScale,
    view: AggregationView,
) -> Chart {
    Chart {
        id,
        title,
        kind,
        scale,
        data: ChartData::Aggregate(view),
    }
}

fn insights_charts(rows: &[&Listing], options: &ViewOptions) -> Vec<Chart> {
    let n = options.top_n;
    vec![
        aggregate_chart(
            "top_property_types",
            format!("Top {} Property Types", n),
            ChartKind::HorizontalBar,
            ColorScale::Turbo,
            count_by(rows, CategoryField::PropertyType, "Listings").top(n),
        ),
        aggregate_chart(
            "top_hosts",
            format!("Top {} Hosts with Highest number of Listings", n),
            ChartKind::HorizontalBar,
            ColorScale::Plasma,
            count_by(rows, CategoryField::HostName, "Listings").top(n),
        ),
        aggregate_chart(
            "room_type_listings",
            "Total Listings in each Room_types".to_string(),
            ChartKind::Pie,
            ColorScale::Turbo,
            count_by(rows, CategoryField::RoomType, "counts"),
        ),
        aggregate_chart(
            "country_listings",
            "Total Listings in each Country".to_string(),
            ChartKind::Choropleth,
            ColorScale::Turbo,
            count_present_by(rows, CategoryField::Country, CategoryField::ListingName, "Total_Listings"),
        ),
    ]
}

fn analysis_charts(rows: &[&Listing]) -> Vec<Chart> {
    vec![
        aggregate_chart(
            "avg_price_by_room_type",
            "Avg Price in each Room type".to_string(),
            ChartKind::VerticalBar,
            ColorScale::Plasma,
            mean_by(rows, CategoryField::RoomType, NumericField::Price)
                .sort_by_value(SortOrder::Ascending),
        ),
        Chart {
            id: "availability_by_room_type",
            title: "Availability by Room_type".to_string(),
            kind: ChartKind::Box,
            scale: ColorScale::Turbo,
            data: ChartData::Distribution(distribution_by(
                rows,
                CategoryField::RoomType,
                NumericField::Availability,
            )),
        },
        aggregate_chart(
            "avg_review_by_room_type",
            "Avg Review Scores in each Room Type".to_string(),
            ChartKind::Pie,
            ColorScale::Plasma,
            mean_by(rows, CategoryField::RoomType, NumericField::ReviewScores),
        ),
        aggregate_chart(
            "avg_price_by_country",
            "Avg Price in each Country".to_string(),
            ChartKind::ScatterGeo,
            ColorScale::Solar,
            mean_by(rows, CategoryField::Country, NumericField::Price),
        ),
        // Whole days; the other means keep their fraction.
        aggregate_chart(
            "avg_availability_by_country",
            "Avg Availability in each Country".to_string(),
            ChartKind::ScatterGeo,
            ColorScale::Turbo,
            mean_by(rows, CategoryField::Country, NumericField::Availability).truncated(),
        ),
        aggregate_chart(
            "avg_review_by_country",
            "Avg Review Scores by Country".to_string(),
            ChartKind::HorizontalBar,
            ColorScale::Viridis,
            mean_by(rows, CategoryField::Country, NumericField::ReviewScores)
                .sort_by_value(SortOrder::Ascending),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{fixture, listing};

    fn chart<'a>(views: &'a PageViews, id: &str) -> &'a Chart {
        views.charts.iter().find(|c| c.id == id).unwrap()
    }

    fn aggregate<'a>(views: &'a PageViews, id: &str) -> &'a AggregationView {
        match &chart(views, id).data {
            ChartData::Aggregate(view) => view,
            other => panic!("expected aggregate view, got {:?}", other),
        }
    }

    #[test]
    fn test_home_has_summary_and_no_charts() {
        let ds = fixture();
        let views = build_page(&ds, &FilterSelection::all(&ds), Page::Home, &ViewOptions::default());
        assert!(views.charts.is_empty());
        let summary = views.summary.unwrap();
        assert_eq!(summary.listings, 5);
        assert_eq!(summary.countries, vec!["Portugal", "Spain"]);
        assert_eq!(summary.room_types.len(), 2);
        assert_eq!(summary.price, Some(PriceRange { min: 20.0, max: 100.0 }));
    }

    #[test]
    fn test_insights_charts() {
        let ds = fixture();
        let views = build_page(&ds, &FilterSelection::all(&ds), Page::Insights, &ViewOptions::default());

        let ids: Vec<&str> = views.charts.iter().map(|c| c.id).collect();
        assert_eq!(
            ids,
            vec!["top_property_types", "top_hosts", "room_type_listings", "country_listings"]
        );
        assert_eq!(views.matched, 5);

        let rooms = aggregate(&views, "room_type_listings");
        assert_eq!(rooms.total(), 5.0);

        let countries = aggregate(&views, "country_listings");
        assert_eq!(countries.get("Spain"), Some(3.0));
        assert_eq!(countries.get("Portugal"), Some(2.0));
    }

    #[test]
    fn test_top_n_option_limits_bar_charts() {
        let listings = (0..15)
            .map(|i| listing("Spain", &format!("Type{:02}", i), "Private room", 10.0 + i as f64))
            .collect();
        let ds = Dataset::from_listings(listings);
        let options = ViewOptions { top_n: 10 };
        let views = build_page(&ds, &FilterSelection::all(&ds), Page::Insights, &options);

        assert_eq!(aggregate(&views, "top_property_types").len(), 10);
        assert_eq!(aggregate(&views, "top_hosts").len(), 10);
        assert_eq!(chart(&views, "top_hosts").title, "Top 10 Hosts with Highest number of Listings");
    }

    #[test]
    fn test_analysis_charts() {
        let ds = fixture();
        let views = build_page(&ds, &FilterSelection::all(&ds), Page::Analysis, &ViewOptions::default());
        assert_eq!(views.charts.len(), 6);

        let price = aggregate(&views, "avg_price_by_room_type");
        assert_eq!(price.keys(), vec!["Private room", "Entire home/apt"]);

        // Spain availability: 40, 100, 200 -> 113.33 truncated
        let availability = aggregate(&views, "avg_availability_by_country");
        assert_eq!(availability.get("Spain"), Some(113.0));

        // Price means are not truncated
        let country_price = aggregate(&views, "avg_price_by_country");
        assert_eq!(country_price.get("Spain"), Some(170.0 / 3.0));

        match &chart(&views, "availability_by_room_type").data {
            ChartData::Distribution(dist) => assert_eq!(dist.groups.len(), 2),
            other => panic!("expected distribution, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_selection_yields_empty_views() {
        let ds = fixture();
        let mut selection = FilterSelection::all(&ds);
        selection.property_types.clear();

        for page in [Page::Insights, Page::Analysis] {
            let views = build_page(&ds, &selection, page, &ViewOptions::default());
            assert_eq!(views.matched, 0);
            assert!(!views.charts.is_empty());
            assert!(views.charts.iter().all(|c| c.data.is_empty()));
        }
    }

    #[test]
    fn test_build_page_is_idempotent() {
        let ds = fixture();
        let before = ds.clone();
        let mut selection = FilterSelection::all(&ds);
        selection.countries.remove("Portugal");

        let first = build_page(&ds, &selection, Page::Analysis, &ViewOptions::default());
        let second = build_page(&ds, &selection, Page::Analysis, &ViewOptions::default());
        assert_eq!(first, second);
        assert_eq!(ds, before);
    }

    #[test]
    fn test_views_serialize_to_json() {
        let ds = fixture();
        let views = build_page(&ds, &FilterSelection::all(&ds), Page::Insights, &ViewOptions::default());
        let json = serde_json::to_value(&views).unwrap();
        assert_eq!(json["page"], "insights");
        assert_eq!(json["charts"][0]["kind"], "horizontal_bar");
        assert_eq!(json["charts"][0]["data"]["key_column"], "Property_type");
        assert_eq!(json["charts"][0]["scale"], "turbo");
    }
}
