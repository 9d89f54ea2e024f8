use std::fmt;

/// The batch pipelines the gateway can submit to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pipeline {
    UpdateEnsembl,
    ProcessMapping,
}

impl Pipeline {
    pub const ALL: [Pipeline; 2] = [Pipeline::UpdateEnsembl, Pipeline::ProcessMapping];

    /// Route segment and metric tag for this pipeline.
    pub const fn as_str(self) -> &'static str {
        match self {
            Pipeline::UpdateEnsembl => "update_ensembl",
            Pipeline::ProcessMapping => "process_mapping",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Pipeline::UpdateEnsembl => "Update Ensembl",
            Pipeline::ProcessMapping => "Process Mapping",
        }
    }

    pub const fn analysis_variable(self) -> &'static str {
        match self {
            Pipeline::UpdateEnsembl => "HIVE_UPDATE_ENSEMBL_ANALYSIS",
            Pipeline::ProcessMapping => "HIVE_PROCESS_MAPPING_ANALYSIS",
        }
    }

    pub const fn queue_uri_variable(self) -> &'static str {
        match self {
            Pipeline::UpdateEnsembl => "HIVE_UPDATE_ENSEMBL_URI",
            Pipeline::ProcessMapping => "HIVE_PROCESS_MAPPING_URI",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
