use std::fs;
use std::path::PathBuf;
use std::process::Command;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/listings.csv");

/// Helper function to run listingviz against the fixture dataset
fn run_listingviz(args: &[&str]) -> Result<String, String> {
    let output = Command::new(env!("CARGO_BIN_EXE_listingviz"))
        .arg("--data")
        .arg(FIXTURE)
        .args(args)
        .output()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

/// Fresh, empty scratch directory per test
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("listingviz-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("stdout is not JSON")
}

#[test]
fn test_home_prints_summary() {
    let stdout = run_listingviz(&["home"]).unwrap();
    assert!(stdout.contains("Listings:       10"), "{}", stdout);
    assert!(stdout.contains("Brazil, Portugal, Spain, United States"));
    assert!(stdout.contains("Hosts:          7"));
    assert!(stdout.contains("Price range:    15 - 200"));
}

#[test]
fn test_home_export_copies_dataset() {
    let dir = scratch_dir("home-export");
    let path = dir.join("all.csv");
    run_listingviz(&["home", "--export", path.to_str().unwrap()]).unwrap();

    assert_eq!(fs::read(&path).unwrap(), fs::read(FIXTURE).unwrap());
}

#[test]
fn test_home_export_keeps_extra_columns_and_number_text() {
    let dir = scratch_dir("home-export-extra");
    let source = dir.join("wide.csv");
    let csv = "Country,Property_type,Room_type,Host_name,Listing_Name,Price,Availability_365,Review_scores,Extra\n\
               Spain,Apartment,Private room,Ana,Sunny flat,35,120,92,keep me\n";
    fs::write(&source, csv).unwrap();
    let dest = dir.join("copy.csv");

    let output = Command::new(env!("CARGO_BIN_EXE_listingviz"))
        .arg("--data")
        .arg(&source)
        .args(["home", "--export"])
        .arg(&dest)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let copied = fs::read_to_string(&dest).unwrap();
    assert_eq!(copied, csv);
    assert!(copied.contains(",35,120,92,keep me"));
}

#[test]
fn test_home_export_refuses_to_overwrite_source() {
    let dir = scratch_dir("home-export-self");
    let source = dir.join("listings.csv");
    fs::copy(FIXTURE, &source).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_listingviz"))
        .arg("--data")
        .arg(&source)
        .args(["home", "--export"])
        .arg(&source)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(fs::read(&source).unwrap(), fs::read(FIXTURE).unwrap());
}

#[test]
fn test_options_lists_filter_values() {
    let stdout = run_listingviz(&["options", "--json"]).unwrap();
    let v = json(&stdout);
    assert_eq!(v["room_type"].as_array().unwrap().len(), 3);
    assert_eq!(v["property_type"][0], "Apartment");
    assert_eq!(v["price"]["min"], 15.0);
    assert_eq!(v["price"]["max"], 200.0);
}

#[test]
fn test_insights_writes_png_per_chart() {
    let dir = scratch_dir("insights");
    let stdout = run_listingviz(&["insights", "--out", dir.to_str().unwrap()]).unwrap();
    assert_eq!(stdout.lines().count(), 4);

    for id in ["top_property_types", "top_hosts", "room_type_listings", "country_listings"] {
        let path = dir.join(format!("insights_{}.png", id));
        let bytes = fs::read(&path).unwrap_or_else(|_| panic!("missing {}", path.display()));
        assert!(is_valid_png(&bytes), "{} is not a PNG", path.display());
    }
}

#[test]
fn test_analysis_writes_svg() {
    let dir = scratch_dir("analysis");
    run_listingviz(&[
        "analysis",
        "--out",
        dir.to_str().unwrap(),
        "--format",
        "svg",
        "--width",
        "640",
        "--height",
        "480",
    ])
    .unwrap();

    let files: Vec<_> = fs::read_dir(&dir).unwrap().collect();
    assert_eq!(files.len(), 6);
    let svg = fs::read_to_string(dir.join("analysis_availability_by_room_type.svg")).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("640"));
}

#[test]
fn test_country_flag_filters_views() {
    let stdout = run_listingviz(&["insights", "--json", "--country", "Spain"]).unwrap();
    let v = json(&stdout);
    assert_eq!(v["total"], 10);
    assert_eq!(v["matched"], 3);

    let rooms = &v["charts"][2]["data"]["rows"];
    let sum: f64 = rooms
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["value"].as_f64().unwrap())
        .sum();
    assert_eq!(sum, 3.0);
}

#[test]
fn test_filter_expression_and_flags_combine() {
    let stdout = run_listingviz(&[
        "analysis",
        "--json",
        "--filter",
        "room_type(\"Private room\") | price(30, 80)",
        "--country",
        "Portugal",
        "--country",
        "United States",
    ])
    .unwrap();
    let v = json(&stdout);
    // Private rooms priced 30..80 in Portugal or the US: only Sam's 55
    assert_eq!(v["matched"], 1);
}

#[test]
fn test_empty_selection_is_not_an_error() {
    let stdout = run_listingviz(&["analysis", "--json", "--filter", "country()"]).unwrap();
    let v = json(&stdout);
    assert_eq!(v["matched"], 0);
    for chart in v["charts"].as_array().unwrap() {
        let data = &chart["data"];
        let len = data["rows"]
            .as_array()
            .or_else(|| data["groups"].as_array())
            .unwrap()
            .len();
        assert_eq!(len, 0, "{} should be empty", chart["id"]);
    }
}

#[test]
fn test_top_limits_bar_charts() {
    let stdout = run_listingviz(&["insights", "--json", "--top", "2"]).unwrap();
    let v = json(&stdout);
    let rows = v["charts"][0]["data"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["key"], "Apartment");
    assert_eq!(rows[0]["value"], 5.0);
}

#[test]
fn test_export_writes_filtered_rows() {
    let dir = scratch_dir("export");
    let path = dir.join("filtered.csv");
    run_listingviz(&[
        "export",
        "--out",
        path.to_str().unwrap(),
        "--price-min",
        "30",
        "--price-max",
        "80",
    ])
    .unwrap();

    let csv = fs::read_to_string(&path).unwrap();
    // header + 35, 80, 60, 40, 55
    assert_eq!(csv.lines().count(), 6);
    assert!(!csv.contains("Villa mar"));
}

#[test]
fn test_config_file_sets_defaults() {
    let dir = scratch_dir("config");
    let config = dir.join("listingviz.json");
    fs::write(
        &config,
        format!(r#"{{ "output_dir": "{}", "top_n": 1, "render": {{ "type": "svg" }} }}"#, dir.join("charts").display()),
    )
    .unwrap();

    run_listingviz(&["--config", config.to_str().unwrap(), "insights"]).unwrap();
    assert!(dir.join("charts/insights_top_hosts.svg").exists());

    let stdout = run_listingviz(&["--config", config.to_str().unwrap(), "insights", "--json"]).unwrap();
    let v = json(&stdout);
    assert_eq!(v["charts"][1]["data"]["rows"].as_array().unwrap().len(), 1);
}

#[test]
fn test_lone_price_bound_outside_data_matches_nothing() {
    let stdout = run_listingviz(&["analysis", "--json", "--price-max", "10"]).unwrap();
    assert_eq!(json(&stdout)["matched"], 0);

    let stdout = run_listingviz(&["analysis", "--json", "--price-min", "500"]).unwrap();
    assert_eq!(json(&stdout)["matched"], 0);
}

#[test]
fn test_inverted_price_range_fails() {
    let err = run_listingviz(&["analysis", "--json", "--price-min", "90", "--price-max", "10"]).unwrap_err();
    assert!(err.contains("Invalid filter selection"), "{}", err);
}

#[test]
fn test_invalid_filter_expression_fails() {
    let err = run_listingviz(&["insights", "--json", "--filter", "host(Ana)"]).unwrap_err();
    assert!(err.contains("invalid filter expression"), "{}", err);
}

#[test]
fn test_missing_column_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_listingviz"))
        .arg("--data")
        .arg(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/missing_column.csv"))
        .arg("home")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Listing_Name"), "{}", stderr);
}

#[test]
fn test_missing_data_file_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_listingviz"))
        .args(["--data", "/nonexistent/listings.csv", "home"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load listings"));
}
