//! Conversions between the wire messages and the contract host's types.

use crate::pb;
use hlc_core::{ContractHost, Identity, Proposal, Response};

impl From<pb::ProposalReq> for Proposal {
    fn from(req: pb::ProposalReq) -> Self {
        let channel = req.channel.trim();
        Proposal {
            channel_id: (!channel.is_empty()).then(|| channel.to_string()),
            contract: req.contract,
            function: req.function,
            args: req.args,
            identity: Identity::new(req.attributes.into_iter().collect()),
        }
    }
}

impl From<Response> for pb::TransactionRes {
    fn from(response: Response) -> Self {
        pb::TransactionRes {
            status: response.status,
            error_kind: response
                .error_kind()
                .map(|kind| kind.as_str().to_string())
                .unwrap_or_default(),
            message: response.message,
            payload: String::from_utf8_lossy(&response.payload).into_owned(),
        }
    }
}

/// Installed contracts and their functions.
pub fn list_contracts(host: &ContractHost) -> pb::ListContractsRes {
    pb::ListContractsRes {
        contracts: host
            .contracts()
            .map(|contract| pb::ContractInfo {
                name: contract.name().to_string(),
                functions: contract.functions(),
            })
            .collect(),
    }
}
