//! Execution of finalized requests.
use reqwest::StatusCode;

use crate::{
    crypto::{decode_then_decrypt, DecryptionError, Secret},
    header,
    response::{DownloadProgressHandler, Progress, RequestInfo, ResponseInfo},
    Cause, DataResponse, RequestError, SecurityOptions,
};

/// Perform `request` and turn the outcome into a [`DataResponse`] or a [`RequestError`].
///
/// Any `2xx` status is a success, including ones with an empty body. When `options` asks for an
/// encrypted response, the body is decrypted with the IV the server sends back in
/// [`header::SECRET`].
pub(crate) async fn execute(
    client: &reqwest::Client,
    request: reqwest::Request,
    options: SecurityOptions,
    secret: &Secret,
    download_progress: Option<&DownloadProgressHandler>,
) -> Result<DataResponse, RequestError> {
    let request_info = RequestInfo::from_request(&request);
    log::debug!(target: "appspanel",
        method = request_info.method.as_str(),
        url = request_info.url.as_str();
        "sending request");

    let mut response = match client.execute(request).await {
        Ok(response) => response,
        Err(err) => {
            log::warn!(target: "appspanel", url = request_info.url.as_str(); "request failed: {err}");
            return Err(RequestError::new(Some(request_info), None, None, Cause::from(err)));
        }
    };
    let response_info = ResponseInfo::from_response(&response);

    let total = response.content_length();
    let mut data = Vec::with_capacity(total.unwrap_or(0).min(1 << 20) as usize);
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                data.extend_from_slice(&chunk);
                if let Some(progress) = download_progress {
                    progress(Progress {
                        completed: data.len() as u64,
                        total,
                    });
                }
            }
            Ok(None) => break,
            Err(err) => {
                log::warn!(target: "appspanel", url = request_info.url.as_str(); "failed to read response body: {err}");
                return Err(RequestError::new(
                    Some(request_info),
                    Some(response_info),
                    Some(data),
                    Cause::from(err),
                ));
            }
        }
    }

    let status = response_info.status;
    log::debug!(target: "appspanel",
        url = request_info.url.as_str(),
        status = status.as_u16();
        "received response");

    if !status.is_success() {
        return Err(RequestError::new(
            Some(request_info),
            Some(response_info),
            Some(data),
            Cause::from_status(status),
        ));
    }

    let data = if options.contains(SecurityOptions::ENCRYPT_RESPONSE) {
        match decrypt(data, &response_info, secret) {
            Ok(data) => data,
            Err((err, data)) => {
                log::warn!(target: "appspanel", url = request_info.url.as_str(); "failed to decrypt response: {err}");
                return Err(RequestError::new(
                    Some(request_info),
                    Some(response_info),
                    Some(data),
                    Cause::DecryptionFailed(err),
                ));
            }
        }
    } else {
        data
    };

    Ok(DataResponse {
        data,
        status_code: status.as_u16(),
        request: request_info,
        response: response_info,
    })
}

/// Decrypt a response body. On failure the raw body is handed back for the error.
fn decrypt(
    data: Vec<u8>,
    response: &ResponseInfo,
    secret: &Secret,
) -> Result<Vec<u8>, (DecryptionError, Vec<u8>)> {
    // Nothing was encrypted, e.g. `204 No Content`.
    if data.is_empty() || response.status == StatusCode::NO_CONTENT {
        return Ok(data);
    }

    let Some(iv) = response.header(header::SECRET) else {
        return Err((DecryptionError::MissingSecretHeader, data));
    };
    match decode_then_decrypt(&data, secret, iv) {
        Ok(plaintext) => Ok(plaintext),
        Err(err) => Err((err, data)),
    }
}
