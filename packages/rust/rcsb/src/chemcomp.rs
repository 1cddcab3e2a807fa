//! Chem-comp (ligand dictionary) lookups.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ChemComp {
    #[serde(default)]
    pdbx_chem_comp_descriptor: Vec<Descriptor>,
}

#[derive(Debug, Deserialize)]
struct Descriptor {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    descriptor: Option<String>,
}

/// First descriptor whose type is `SMILES`, case-insensitively.
fn first_smiles(body: &str) -> Option<String> {
    let comp: ChemComp = serde_json::from_str(body)
        .inspect_err(|e| debug!(error = %e, "unparseable chem-comp response"))
        .ok()?;

    comp.pdbx_chem_comp_descriptor
        .into_iter()
        .find(|d| d.kind.as_deref().is_some_and(|k| k.eq_ignore_ascii_case("SMILES")))
        .and_then(|d| d.descriptor)
}

pub(crate) async fn fetch_smiles(client: &Client, url: &str) -> Option<String> {
    let response = client
        .get(url)
        .send()
        .await
        .inspect_err(|e| debug!(%url, error = %e, "chem-comp request failed"))
        .ok()?;

    if response.status() != StatusCode::OK {
        debug!(%url, status = response.status().as_u16(), "chem-comp not found");
        return None;
    }

    let body = response.text().await.ok()?;
    first_smiles(&body)
}

#[cfg(test)]
mod tests {
    use ligbench_shared::DownloadConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::RcsbClient;

    const ATP: &str = r#"{
        "chem_comp": {"id": "ATP"},
        "pdbx_chem_comp_descriptor": [
            {"type": "InChI", "descriptor": "InChI=1S/..."},
            {"type": "SMILES_CANONICAL", "descriptor": "ignored"},
            {"type": "smiles", "descriptor": "Nc1ncnc2c1ncn2"},
            {"type": "SMILES", "descriptor": "second"}
        ]
    }"#;

    #[test]
    fn picks_first_smiles_descriptor() {
        assert_eq!(first_smiles(ATP).as_deref(), Some("Nc1ncnc2c1ncn2"));
        assert_eq!(first_smiles(r#"{"chem_comp": {}}"#), None);
        assert_eq!(first_smiles("not json"), None);
    }

    #[tokio::test]
    async fn fetches_smiles_from_data_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/core/chemcomp/atp"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ATP))
            .mount(&server)
            .await;

        let config = DownloadConfig {
            data_base_url: server.uri(),
            ..Default::default()
        };
        let client = RcsbClient::new(&config).unwrap();

        assert_eq!(
            client.fetch_chemcomp_smiles(" ATP ").await.as_deref(),
            Some("Nc1ncnc2c1ncn2")
        );
        // unmatched paths get wiremock's default 404
        assert_eq!(client.fetch_chemcomp_smiles("XYZ").await, None);
    }
}
