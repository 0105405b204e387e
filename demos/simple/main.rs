use appspanel::{ClientConfig, SecurityOptions, WebService};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let app_name = std::env::var("APPSPANEL_APP_NAME")?;
    let app_key = std::env::var("APPSPANEL_APP_KEY")?;
    let private_key = std::env::var("APPSPANEL_PRIVATE_KEY")?;

    let manager = ClientConfig::new(app_name, app_key, private_key).to_client()?;

    // Signed claim, encrypted body both ways.
    let response = manager
        .request_endpoint(&WebService::Version)
        .secure(SecurityOptions::ALL)
        .send()
        .await;

    match response {
        Ok(response) => println!(
            "Version ({}): {}",
            response.status_code,
            String::from_utf8_lossy(&response.data)
        ),
        Err(err) => {
            println!("Request failed: {err}");
            if let Some(info) = err.backend_info {
                println!("Backend error {} ({}): {}", info.code, info.key, info.message);
            }
        }
    }

    Ok(())
}
