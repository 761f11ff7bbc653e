//! Medical record folder contract: the folder aggregate and its embedded sections.

use crate::args;
use crate::error::{ContractError, ContractResult};
use crate::host::{ack, Contract};
use crate::resource::ResourceContract;
use crate::store::ContractContext;
use fhir::{FolderSection, MedicalRecordFolder};

const ADD_ENTRY: &str = "AddFolderEntry";
const REMOVE_ENTRY: &str = "RemoveFolderEntry";

pub struct FolderContract {
    resources: ResourceContract<MedicalRecordFolder>,
}

fn section(raw: &str) -> ContractResult<FolderSection> {
    raw.parse().map_err(|_| {
        ContractError::InvalidArguments(format!(
            "unknown folder section '{raw}', expected one of {}",
            FolderSection::ALL.map(FolderSection::as_str).join(", ")
        ))
    })
}

impl FolderContract {
    pub fn new(resources: ResourceContract<MedicalRecordFolder>) -> Self {
        Self { resources }
    }

    fn add_entry(
        &self,
        ctx: &mut dyn ContractContext,
        id: &str,
        section_name: &str,
        payload: &str,
    ) -> ContractResult<Vec<u8>> {
        let section = section(section_name)?;
        let entry: serde_json::Value = serde_json::from_str(payload)
            .map_err(|err| ContractError::InvalidPayload(format!("{section_name} entry: {err}")))?;

        let (id, mut folder) = self.resources.load(ctx, id)?;
        self.resources.check_access(ctx, &folder)?;
        folder.push_entry(section, entry)?;
        self.resources.store(ctx, &id, &folder)?;
        ack(format!("entry added to {} of folder {id}", section.as_str()))
    }

    fn remove_entry(
        &self,
        ctx: &mut dyn ContractContext,
        id: &str,
        section_name: &str,
        index: &str,
    ) -> ContractResult<Vec<u8>> {
        let section = section(section_name)?;
        let (id, mut folder) = self.resources.load(ctx, id)?;
        self.resources.check_access(ctx, &folder)?;

        let position = args::parse_index(index, folder.section_len(section))?;
        folder.remove_entry(section, position)?;
        self.resources.store(ctx, &id, &folder)?;
        ack(format!(
            "entry {position} removed from {} of folder {id}",
            section.as_str()
        ))
    }
}

impl Contract for FolderContract {
    fn name(&self) -> &str {
        self.resources.name()
    }

    fn functions(&self) -> Vec<String> {
        let mut functions = self.resources.function_names();
        functions.push(ADD_ENTRY.to_string());
        functions.push(REMOVE_ENTRY.to_string());
        functions
    }

    fn invoke(
        &self,
        ctx: &mut dyn ContractContext,
        function: &str,
        args: &[String],
    ) -> ContractResult<Vec<u8>> {
        if let Some(result) = self.resources.dispatch(ctx, function, args) {
            return result;
        }
        match function {
            ADD_ENTRY => {
                let [id, section, payload] = args::exact::<3>(function, args)?;
                self.add_entry(ctx, id, section, payload)
            }
            REMOVE_ENTRY => {
                let [id, section, index] = args::exact::<3>(function, args)?;
                self.remove_entry(ctx, id, section, index)
            }
            _ => Err(self.resources.unknown_function(function)),
        }
    }
}
