use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::models::ReferenceCatalog;

const LABEL_DELIMITER: &str = " (";

const NULL_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed reading {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed parsing {}{}: {reason}", path.display(), line_suffix(*line))]
    Malformed {
        path: PathBuf,
        line: Option<u64>,
        reason: String,
    },
    #[error("{} has no `{column}` column", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },
}

impl CatalogLoadError {
    pub fn is_source_failure(&self) -> bool {
        !matches!(self, Self::MissingColumn { .. })
    }
}

fn line_suffix(line: Option<u64>) -> String {
    line.map(|line| format!(" (line {line})")).unwrap_or_default()
}

#[derive(Debug)]
pub struct CatalogLoad {
    pub catalog: ReferenceCatalog,
    pub issues: Vec<CatalogLoadError>,
}

impl CatalogLoad {
    pub fn is_degraded(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

pub fn location_name(label: &str) -> &str {
    match label.split_once(LABEL_DELIMITER) {
        Some((name, _)) => name,
        None => label,
    }
}

pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

pub fn load_catalog(flights: impl AsRef<Path>, hotels: impl AsRef<Path>) -> CatalogLoad {
    let mut issues = Vec::new();

    let flight_columns = read_file(flights.as_ref(), &["from", "to"], &mut issues);
    let hotel_columns = read_file(hotels.as_ref(), &["place"], &mut issues);

    finish(flight_columns, hotel_columns, issues)
}

pub fn load_catalog_from_readers<F, H>(flights: F, hotels: H) -> CatalogLoad
where
    F: Read,
    H: Read,
{
    let mut issues = Vec::new();

    let flight_columns = read_source(flights, Path::new("<flights>"), &["from", "to"], &mut issues);
    let hotel_columns = read_source(hotels, Path::new("<hotels>"), &["place"], &mut issues);

    finish(flight_columns, hotel_columns, issues)
}

fn finish(
    flight_columns: Vec<Option<BTreeSet<String>>>,
    hotel_columns: Vec<Option<BTreeSet<String>>>,
    issues: Vec<CatalogLoadError>,
) -> CatalogLoad {
    let mut flight_columns = flight_columns.into_iter();
    let origins = flight_columns.next().flatten().unwrap_or_default();
    let destinations = flight_columns.next().flatten().unwrap_or_default();
    let stay_places = hotel_columns.into_iter().next().flatten().unwrap_or_default();

    for issue in &issues {
        warn!(error = %issue, "reference catalog degraded");
    }

    let catalog = ReferenceCatalog::new(origins, destinations, stay_places);
    info!(
        origins = catalog.origins().len() - 1,
        destinations = catalog.destinations().len() - 1,
        stay_places = catalog.stay_places().len() - 1,
        issues = issues.len(),
        "reference catalog loaded"
    );

    CatalogLoad { catalog, issues }
}

fn read_file(
    path: &Path,
    columns: &[&'static str],
    issues: &mut Vec<CatalogLoadError>,
) -> Vec<Option<BTreeSet<String>>> {
    match File::open(path) {
        Ok(file) => read_source(file, path, columns, issues),
        Err(source) => {
            issues.push(CatalogLoadError::Unreadable {
                path: path.to_path_buf(),
                source,
            });
            vec![None; columns.len()]
        }
    }
}

fn read_source<R: Read>(
    reader: R,
    path: &Path,
    columns: &[&'static str],
    issues: &mut Vec<CatalogLoadError>,
) -> Vec<Option<BTreeSet<String>>> {
    match collect_locations(reader, path, columns) {
        Ok(sets) => {
            for (column, set) in columns.iter().copied().zip(&sets) {
                if set.is_none() {
                    issues.push(CatalogLoadError::MissingColumn {
                        path: path.to_path_buf(),
                        column,
                    });
                }
            }
            sets
        }
        Err(error) => {
            issues.push(error);
            vec![None; columns.len()]
        }
    }
}

fn collect_locations<R: Read>(
    reader: R,
    path: &Path,
    columns: &[&'static str],
) -> Result<Vec<Option<BTreeSet<String>>>, CatalogLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|err| malformed(path, err))?
        .clone();
    if headers.is_empty() {
        return Err(CatalogLoadError::Malformed {
            path: path.to_path_buf(),
            line: None,
            reason: "no columns to parse".to_string(),
        });
    }

    let indices = columns
        .iter()
        .map(|column| {
            headers
                .iter()
                .position(|header| normalize_header(header) == *column)
        })
        .collect::<Vec<_>>();
    let mut sets = vec![BTreeSet::new(); columns.len()];

    for record in csv_reader.records() {
        let record = record.map_err(|err| malformed(path, err))?;
        // Short rows are padded with nulls, long rows are rejected.
        if record.len() > headers.len() {
            return Err(CatalogLoadError::Malformed {
                path: path.to_path_buf(),
                line: record.position().map(|pos| pos.line()),
                reason: format!(
                    "expected {} fields, saw {}",
                    headers.len(),
                    record.len()
                ),
            });
        }

        for (set, index) in sets.iter_mut().zip(&indices) {
            let Some(index) = index else {
                continue;
            };
            if let Some(label) = record.get(*index).filter(|cell| !is_null(cell)) {
                set.insert(location_name(label).to_string());
            }
        }
    }

    Ok(indices
        .into_iter()
        .zip(sets)
        .map(|(index, set)| index.map(|_| set))
        .collect())
}

fn is_null(cell: &str) -> bool {
    cell.trim().is_empty() || NULL_MARKERS.contains(&cell)
}

fn malformed(path: &Path, err: csv::Error) -> CatalogLoadError {
    CatalogLoadError::Malformed {
        path: path.to_path_buf(),
        line: err.position().map(|pos| pos.line()),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LOCATION_SENTINEL, PLACE_SENTINEL};

    const FLIGHTS: &str = "\
travelCode, From ,TO,flightType,price
0,Recife (PE),Florianopolis (SC),firstClass,1434.38
1,Florianopolis (SC),Recife (PE),firstClass,1292.29
2,Brasilia (DF),Florianopolis (SC),economic,1000
3,Aracaju (SE),,premium,700
4,Recife (PE)
";

    const HOTELS: &str = "\
travelCode,userCode,name,Place,days
0,0,Hotel A,Florianopolis (SC),4
1,0,Hotel K,Salvador (BH),2
2,1,Hotel K,Salvador (BH),3
3,1,Hotel Z,NaN,1
";

    #[test]
    fn strips_parenthesised_codes() {
        assert_eq!(location_name("Paris (CDG)"), "Paris");
        assert_eq!(location_name("Sao Paulo (SP) (Centro)"), "Sao Paulo");
        assert_eq!(location_name("Lisbon"), "Lisbon");
        assert_eq!(location_name("Rome(FCO)"), "Rome(FCO)");
    }

    #[test]
    fn derives_sorted_distinct_choices() {
        let load = load_catalog_from_readers(FLIGHTS.as_bytes(), HOTELS.as_bytes());
        assert!(!load.is_degraded(), "{:?}", load.issues);

        assert_eq!(
            load.catalog.origins(),
            [LOCATION_SENTINEL, "Aracaju", "Brasilia", "Florianopolis", "Recife"]
        );
        assert_eq!(
            load.catalog.destinations(),
            [LOCATION_SENTINEL, "Florianopolis", "Recife"]
        );
        assert_eq!(
            load.catalog.stay_places(),
            [PLACE_SENTINEL, "Florianopolis", "Salvador"]
        );
    }

    #[test]
    fn missing_column_degrades_only_that_field() {
        let flights = "from,price\nParis (CDG),100\n";
        let load = load_catalog_from_readers(flights.as_bytes(), HOTELS.as_bytes());

        assert_eq!(load.catalog.origins(), [LOCATION_SENTINEL, "Paris"]);
        assert_eq!(load.catalog.destinations(), [LOCATION_SENTINEL]);
        assert_eq!(load.issues.len(), 1);
        assert!(matches!(
            load.issues[0],
            CatalogLoadError::MissingColumn { column: "to", .. }
        ));
        assert!(!load.issues[0].is_source_failure());
    }

    #[test]
    fn unreadable_flights_leave_hotels_intact() {
        let hotels = std::env::temp_dir().join("expense-core-missing-flights-hotels.csv");
        std::fs::write(&hotels, HOTELS).unwrap();

        let load = load_catalog("/definitely/not/here/flights.csv", &hotels);
        std::fs::remove_file(&hotels).ok();

        assert_eq!(load.catalog.origins(), [LOCATION_SENTINEL]);
        assert_eq!(load.catalog.destinations(), [LOCATION_SENTINEL]);
        assert_eq!(
            load.catalog.stay_places(),
            [PLACE_SENTINEL, "Florianopolis", "Salvador"]
        );
        assert!(matches!(
            load.issues.as_slice(),
            [CatalogLoadError::Unreadable { .. }]
        ));
    }

    #[test]
    fn overlong_row_fails_the_whole_table() {
        let flights = "from,to\nParis (CDG),Tokyo (HND)\nRome (FCO),Oslo (OSL),extra\n";
        let load = load_catalog_from_readers(flights.as_bytes(), HOTELS.as_bytes());

        assert_eq!(load.catalog.origins(), [LOCATION_SENTINEL]);
        assert_eq!(load.catalog.destinations(), [LOCATION_SENTINEL]);
        assert_eq!(load.catalog.stay_places().len(), 3);
        assert!(matches!(
            load.issues.as_slice(),
            [CatalogLoadError::Malformed { line: Some(3), .. }]
        ));
    }

    #[test]
    fn sentinel_labels_in_data_are_not_listed_twice() {
        let flights = "from,to\nSelect a location (XX),Paris (CDG)\nParis (CDG),Select a location\n";
        let hotels = "place\nSelect a place (YY)\nRome (FCO)\n";
        let load = load_catalog_from_readers(flights.as_bytes(), hotels.as_bytes());

        assert_eq!(load.catalog.origins(), [LOCATION_SENTINEL, "Paris"]);
        assert_eq!(load.catalog.destinations(), [LOCATION_SENTINEL, "Paris"]);
        assert_eq!(load.catalog.stay_places(), [PLACE_SENTINEL, "Rome"]);
    }

    #[test]
    fn na_markers_are_treated_as_empty() {
        let hotels = "place\n#NA\n-nan\n1.#QNAN\n#N/A N/A\nRome (FCO)\n";
        let load = load_catalog_from_readers(FLIGHTS.as_bytes(), hotels.as_bytes());
        assert_eq!(load.catalog.stay_places(), [PLACE_SENTINEL, "Rome"]);
    }

    #[test]
    fn empty_table_is_malformed() {
        let load = load_catalog_from_readers("".as_bytes(), "".as_bytes());
        assert_eq!(load.issues.len(), 2);
        assert!(load.issues.iter().all(CatalogLoadError::is_source_failure));
        assert_eq!(load.catalog, ReferenceCatalog::sentinel_only());
    }
}
