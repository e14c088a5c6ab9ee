use std::sync::mpsc::Receiver;
use std::time::Duration;

use entity_http_client::http::FileUpload;
use entity_http_client::{ApiRequest, ApiService};

use crate::config::Target;
use crate::{Note, Outcome, Priority};

pub fn run(service: &ApiService<Note>, rx: &Receiver<Outcome>, target: &Target) -> Result<(), String> {
    println!("Scenario: requests");

    let mut get = ApiRequest::get(&target.sample_url());
    get.add_url_param("limit", "1");
    service.exec(get, "get-note").map_err(|e| e.to_string())?;
    report(rx)?;

    let note = Note {
        id: 3,
        title: "Echo me".to_string(),
        priority: Priority::Low,
        tags: vec!["sample".to_string()],
    };
    let post = ApiRequest::post(&target.echo_url())
        .with_entity(&note)
        .map_err(|e| e.to_string())?
        .without_response();
    service.exec(post, "post-note").map_err(|e| e.to_string())?;
    report(rx)?;

    let file = FileUpload::from_path(&target.upload_file, None).map_err(|e| e.to_string())?;
    println!("Uploading {} ({} bytes)", file.file_name(), file.len());
    let upload = ApiRequest::upload(&target.upload_url(), file)
        .without_response();
    service.exec_with_generated_id(upload).map_err(|e| e.to_string())?;
    report(rx)?;

    Ok(())
}

fn report(rx: &Receiver<Outcome>) -> Result<(), String> {
    match rx.recv_timeout(Duration::from_secs(30)) {
        Ok(Ok((id, response))) => {
            println!("{}: status {}", id, response.status());
            match response.data() {
                Some(note) => println!("{}: {:?}", id, note),
                None => println!("{}: {}", id, response.raw()),
            }
            Ok(())
        }
        Ok(Err((id, error))) => Err(format!("{}: {}", id, error)),
        Err(e) => Err(format!("No response: {e}")),
    }
}
