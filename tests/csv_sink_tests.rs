use chrono::NaiveDate;
use tempfile::TempDir;

use geoguessr_daily_tracker::csv::parse_rows;
use geoguessr_daily_tracker::csv_sink::CsvSink;
use geoguessr_daily_tracker::error::TrackerError;
use geoguessr_daily_tracker::model::record::{CSV_COLUMNS, ChallengeToken, GameRecord, RoundResult};
use geoguessr_daily_tracker::sink::{RecordSink, SaveOutcome, SkipReason};

fn sample_record(date: NaiveDate) -> GameRecord {
    GameRecord {
        token: ChallengeToken::new("Yq3m7XPbZ2kTn9Rc"),
        total_score: 23000,
        total_distance: 120.5,
        rounds: vec![
            RoundResult { round_number: 1, score: 5000, distance: 0.0 },
            RoundResult { round_number: 2, score: 4500, distance: 10.2 },
        ],
        date,
    }
}

fn new_year() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn read_rows(sink: &CsvSink) -> Vec<Vec<String>> {
    parse_rows(&std::fs::read_to_string(sink.path()).expect("csv file"))
}

fn col(name: &str) -> usize {
    CSV_COLUMNS.iter().position(|c| *c == name).unwrap()
}

#[test]
fn first_save_creates_file_with_header_and_row() {
    let dir = TempDir::new().unwrap();
    let sink = CsvSink::in_dir(dir.path());

    let outcome = sink.save(&sample_record(new_year())).expect("save");
    assert_eq!(outcome, SaveOutcome::Inserted);

    let rows = read_rows(&sink);
    assert_eq!(rows.len(), 2, "rows were: {:?}", rows);
    assert_eq!(rows[0], CSV_COLUMNS.to_vec());
    let row = &rows[1];
    assert_eq!(row[col("date")], "2024-01-01");
    assert_eq!(row[col("total_score")], "23000");
    assert_eq!(row[col("total_distance")], "120.5");
    assert_eq!(row[col("round1_score")], "5000");
    assert_eq!(row[col("round2_distance")], "10.2");
    assert_eq!(row[col("round3_score")], "");
    assert!(row[col("link")].contains("Yq3m7XPbZ2kTn9Rc"));
}

#[test]
fn empty_existing_file_gets_header() {
    let dir = TempDir::new().unwrap();
    let sink = CsvSink::in_dir(dir.path());
    std::fs::write(sink.path(), "").unwrap();

    assert_eq!(sink.save(&sample_record(new_year())).unwrap(), SaveOutcome::Inserted);
    let rows = read_rows(&sink);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "date");
}

#[test]
fn same_date_twice_is_skipped_and_file_unchanged() {
    let dir = TempDir::new().unwrap();
    let sink = CsvSink::in_dir(dir.path());

    assert_eq!(sink.save(&sample_record(new_year())).unwrap(), SaveOutcome::Inserted);
    let before = std::fs::read_to_string(sink.path()).unwrap();

    let mut again = sample_record(new_year());
    again.total_score = 1;
    let outcome = sink.save(&again).unwrap();
    assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::DuplicateDate));

    let after = std::fs::read_to_string(sink.path()).unwrap();
    assert_eq!(before, after);
    assert_eq!(read_rows(&sink).len(), 2);
}

#[test]
fn new_dates_append_below_existing_rows() {
    let dir = TempDir::new().unwrap();
    let sink = CsvSink::in_dir(dir.path());

    sink.save(&sample_record(new_year())).unwrap();
    sink.save(&sample_record(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())).unwrap();

    let rows = read_rows(&sink);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "date");
    assert_eq!(rows[1][0], "2024-01-01");
    assert_eq!(rows[2][0], "2024-01-02");
}

#[test]
fn dedup_reads_date_column_by_name_in_existing_file() {
    let dir = TempDir::new().unwrap();
    let sink = CsvSink::in_dir(dir.path());
    // File written without a trailing newline.
    std::fs::write(
        sink.path(),
        format!("{}\n2024-01-01,20000,50.0,,,,,,,,,,,https://www.geoguessr.com/results/x", CSV_COLUMNS.join(",")),
    )
    .unwrap();

    assert_eq!(
        sink.save(&sample_record(new_year())).unwrap(),
        SaveOutcome::Skipped(SkipReason::DuplicateDate)
    );

    let next = sample_record(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    assert_eq!(sink.save(&next).unwrap(), SaveOutcome::Inserted);
    let rows = read_rows(&sink);
    assert_eq!(rows.len(), 3, "rows were: {:?}", rows);
    assert_eq!(rows[2][0], "2024-01-03");
}

#[test]
fn file_without_date_column_is_a_sink_error() {
    let dir = TempDir::new().unwrap();
    let sink = CsvSink::in_dir(dir.path());
    std::fs::write(sink.path(), "day,score\n2024-01-01,1\n").unwrap();

    let err = sink.save(&sample_record(new_year())).unwrap_err();
    assert!(matches!(err, TrackerError::Sink(_)), "got {:?}", err);
}

#[test]
fn reordered_header_is_rejected_and_file_left_alone() {
    let dir = TempDir::new().unwrap();
    let sink = CsvSink::in_dir(dir.path());
    let seeded = "date,total_score,round1_score,round1_distance,total_distance,link\n";
    std::fs::write(sink.path(), seeded).unwrap();

    let err = sink.save(&sample_record(new_year())).unwrap_err();
    assert!(matches!(err, TrackerError::Sink(_)), "got {:?}", err);
    assert_eq!(std::fs::read_to_string(sink.path()).unwrap(), seeded);
}

#[test]
fn missing_parent_directory_is_created() {
    let dir = TempDir::new().unwrap();
    let sink = CsvSink::in_dir(&dir.path().join("nested").join("data"));
    assert_eq!(sink.save(&sample_record(new_year())).unwrap(), SaveOutcome::Inserted);
    assert!(sink.path().exists());
}
