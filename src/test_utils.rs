use crate::crossfilter::Crossfilter;
use crate::models::Record;
use crate::store::RecordStore;

/// Create a Record with only rank, sex and salary of interest.
pub(crate) fn record(rank: &str, sex: &str, salary: u32) -> Record {
    Record::new(rank, "A", 10, 5, sex, salary)
}

/// Ten records: six men, four women (two Prof, one AsstProf, one AssocProf).
pub(crate) fn records() -> Vec<Record> {
    vec![
        Record::new("Prof", "B", 19, 18, "Male", 139750),
        Record::new("Prof", "B", 20, 16, "Male", 173200),
        Record::new("AsstProf", "B", 4, 3, "Male", 79750),
        Record::new("Prof", "B", 45, 39, "Male", 115000),
        Record::new("Prof", "A", 40, 41, "Male", 141500),
        Record::new("AssocProf", "A", 6, 6, "Male", 97000),
        Record::new("Prof", "A", 30, 23, "Female", 175000),
        Record::new("Prof", "A", 45, 45, "Female", 147765),
        Record::new("AsstProf", "B", 2, 0, "Female", 77500),
        Record::new("AssocProf", "B", 12, 8, "Female", 88000),
    ]
}

/// Create a Crossfilter over [records] with no dimensions.
pub(crate) fn crossfilter() -> Crossfilter<Record> {
    Crossfilter::new(RecordStore::new(records()))
}
