use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::pointing_errors::PointingError;

use super::{ObservationStore, StoredObservation, StoredRows};

/// Observation store backed by a header-led CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvObservationStore {
    path: Utf8PathBuf,
}

impl CsvObservationStore {
    pub fn new(path: impl AsRef<Utf8Path>) -> Self {
        CsvObservationStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Write `rows` to a new store file, replacing any existing one.
    pub fn create(
        path: impl AsRef<Utf8Path>,
        rows: &[StoredObservation],
    ) -> Result<Self, PointingError> {
        let store = CsvObservationStore::new(path);
        let mut writer = csv::Writer::from_path(&store.path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(store)
    }

    /// Remove the entry with the given `nml_id` from the file.
    ///
    /// The file is rewritten through a temporary sibling and renamed in place; rows other
    /// than the deleted one are copied verbatim. Callers must re-load to see the change.
    ///
    /// Return
    /// ----------
    /// * `true` if an entry was removed.
    pub fn delete_record(&self, nml_id: u64) -> Result<bool, PointingError> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| self.unavailable(e))?;
        let headers = reader.headers()?.clone();
        let column = headers
            .iter()
            .position(|h| h == "nml_id")
            .ok_or_else(|| self.unavailable("missing nml_id column"))?;

        let tmp = self.path.with_extension("csv.tmp");
        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.write_record(&headers)?;

        let target = nml_id.to_string();
        let mut removed = false;
        for record in reader.records() {
            let record = record?;
            if record.get(column).map(str::trim) == Some(target.as_str()) {
                removed = true;
                continue;
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, &self.path)?;
        Ok(removed)
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> PointingError {
        PointingError::SourceUnavailable(format!("{}: {reason}", self.path))
    }
}

impl ObservationStore for CsvObservationStore {
    fn describe(&self) -> String {
        self.path.to_string()
    }

    fn open(&self) -> Result<StoredRows<'_>, PointingError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| self.unavailable(e))?;

        Ok(Box::new(reader.into_deserialize::<StoredObservation>().map(
            move |row| row.map_err(|e| self.unavailable(e)),
        )))
    }
}

#[cfg(test)]
mod csv_store_test {
    use super::*;
    use crate::observations::observations_test::row;

    fn temp_path(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap()
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![row(1, true, false), row(2, false, true)];
        let store = CsvObservationStore::create(temp_path(&dir, "anl.csv"), &rows).unwrap();

        let read: Vec<_> = store.open().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(read, rows);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvObservationStore::new(temp_path(&dir, "nope.csv"));
        assert!(matches!(
            store.open(),
            Err(PointingError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_delete_record() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![row(1, true, true), row(2, true, true), row(3, true, true)];
        let store = CsvObservationStore::create(temp_path(&dir, "anl.csv"), &rows).unwrap();

        assert!(store.delete_record(2).unwrap());
        assert!(!store.delete_record(42).unwrap());

        let ids: Vec<u64> = store
            .open()
            .unwrap()
            .map(|r| r.unwrap().nml_id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_decode_error_is_item() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "broken.csv");
        std::fs::write(
            &path,
            concat!(
                "nml_id,cat_ra,cat_dc,astr_ra,astr_dc,sxtr_ra,sxtr_dc,",
                "dt_utc,temperature,pressure,humidity,image_fn\n",
                "x,1.0,0.5,,,,,2021-01-01T00:00:00,0,0,0,\n",
            ),
        )
        .unwrap();

        let items: Vec<_> = CsvObservationStore::new(path).open().unwrap().collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(PointingError::SourceUnavailable(_))));
    }
}
