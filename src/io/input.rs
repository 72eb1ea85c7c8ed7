//! Parses the two CSV input formats: the required data-input table and the
//! optional vertex-similarity table.

use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;
use crate::level::DataRow;
use crate::vertex::VertexRow;

#[derive(Debug, Deserialize)]
struct DataInputRecord {
    #[serde(rename = "dataLevel")]
    data_level: String,
    #[serde(rename = "dataReplicate")]
    data_replicate: String,
    vertex: String,
    intensity: f64,
}

#[derive(Debug, Deserialize)]
struct VertexInputRecord {
    #[serde(rename = "vertexLevel1")]
    vertex_level_1: String,
    #[serde(rename = "vertexLevel2")]
    vertex_level_2: String,
    vertex1: String,
    vertex2: String,
    similarity: f64,
}

/// Parse the required data-input CSV: `dataLevel, dataReplicate, vertex,
/// intensity`. Any parse failure aborts the run as an input-format error.
pub fn read_data_input(path: &Path) -> Result<Vec<DataRow>, AppError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        AppError::InputFormat(format!("cannot open data input '{}': {e}", path.display()))
    })?;

    let mut rows = Vec::new();
    for (line, record) in reader.deserialize::<DataInputRecord>().enumerate() {
        let record = record.map_err(|e| {
            AppError::InputFormat(format!("data input row {} is malformed: {e}", line + 2))
        })?;
        rows.push(DataRow {
            level: record.data_level,
            replicate: record.data_replicate,
            entity: record.vertex,
            intensity: record.intensity,
        });
    }
    Ok(rows)
}

/// Parse the optional vertex-similarity CSV: `vertexLevel1, vertexLevel2,
/// vertex1, vertex2, similarity`.
pub fn read_vertex_input(path: &Path) -> Result<Vec<VertexRow>, AppError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        AppError::InputFormat(format!(
            "cannot open vertex input '{}': {e}",
            path.display()
        ))
    })?;

    let mut rows = Vec::new();
    for (line, record) in reader.deserialize::<VertexInputRecord>().enumerate() {
        let record = record.map_err(|e| {
            AppError::InputFormat(format!("vertex input row {} is malformed: {e}", line + 2))
        })?;
        rows.push(VertexRow {
            level_a: record.vertex_level_1,
            level_b: record.vertex_level_2,
            entity_a: record.vertex1,
            entity_b: record.vertex2,
            similarity: record.similarity,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn reads_well_formed_data_input() {
        let file = write_csv(
            "dataLevel,dataReplicate,vertex,intensity\nA,r1,e1,1.5\nA,r1,e2,2.5\n",
        );
        let rows = read_data_input(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].level, "A");
        assert_eq!(rows[0].replicate, "r1");
        assert_eq!(rows[0].entity, "e1");
        assert_eq!(rows[0].intensity, 1.5);
    }

    #[test]
    fn rejects_unparsable_intensity() {
        let file = write_csv("dataLevel,dataReplicate,vertex,intensity\nA,r1,e1,notanumber\n");
        assert!(read_data_input(file.path()).is_err());
    }

    #[test]
    fn reads_vertex_input() {
        let file = write_csv(
            "vertexLevel1,vertexLevel2,vertex1,vertex2,similarity\nA,B,e1,e2,0.9\n",
        );
        let rows = read_vertex_input(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].similarity, 0.9);
    }
}
