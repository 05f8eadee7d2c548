//! Decoding of contents-endpoint payloads into text

use crate::error::{AssessorError, Result};
use crate::github::{EncodedContent, RepoLocation, RepositorySource};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Decodes a contents-endpoint payload into text.
///
/// GitHub wraps base64 bodies at 60 columns, so all whitespace is dropped
/// before decoding. Anything that is not base64 or not UTF-8 is an error.
pub fn decode_content(payload: &EncodedContent) -> Result<String> {
    if !payload.encoding.eq_ignore_ascii_case("base64") {
        return Err(AssessorError::Decode(format!(
            "unsupported content encoding '{}'",
            payload.encoding
        )));
    }

    let compact: String = payload.content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(String::from_utf8(bytes)?)
}

/// Fetches one file through `source` and returns its decoded text
pub async fn fetch_text<S>(source: &S, repo: &RepoLocation, path: &str, branch: &str) -> Result<String>
where
    S: RepositorySource + ?Sized,
{
    let payload = source.fetch_file(repo, path, branch).await?;
    decode_content(&payload)
}
