mod config;
mod scenarios;

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use entity_http_client::codec::{Entity, FieldTable};
use entity_http_client::{ApiError, ApiResponse, ApiService, ClientConfig, Delegate};

use config::load_target;

#[derive(Debug, Clone, Default)]
pub enum Priority {
    #[default]
    Low,
    High,
}

entity_http_client::enumeration!(Priority {
    Low => "LOW",
    High => "HIGH",
});

#[derive(Debug, Default)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub priority: Priority,
    pub tags: Vec<String>,
}

impl Entity for Note {
    fn fields(table: FieldTable<Self>) -> FieldTable<Self> {
        table
            .field("id", |n| &n.id, |n| &mut n.id)
            .field("title", |n| &n.title, |n| &mut n.title)
            .enumeration("priority", |n| &n.priority, |n| &mut n.priority)
            .collection("tags", |n| &n.tags, |n| &mut n.tags)
    }
}

/// Result of one request, as reported to the delegate.
pub type Outcome = Result<(String, ApiResponse<Note>), (String, ApiError)>;

struct Printer {
    tx: Sender<Outcome>,
}

impl Delegate<Note> for Printer {
    fn did_receive_response(&self, response: ApiResponse<Note>, exec_time: Duration, id: &str) {
        println!("{} finished in {}ms", id, exec_time.as_millis());
        let _ = self.tx.send(Ok((id.to_string(), response)));
    }

    fn did_fail(&self, error: ApiError, id: &str, status: Option<u16>) {
        match status {
            Some(code) => println!("{} failed with status {}", id, code),
            None => println!("{} failed", id),
        }
        let _ = self.tx.send(Err((id.to_string(), error)));
    }
}

fn main() -> Result<(), String> {
    let target = load_target()?;
    let config = ClientConfig::load_default().map_err(|e| e.to_string())?;

    let (tx, rx): (Sender<Outcome>, Receiver<Outcome>) = mpsc::channel();
    let mut service =
        ApiService::new(Arc::new(Printer { tx }), config).map_err(|e| e.to_string())?;
    service.prepare().map_err(|e| e.to_string())?;

    scenarios::codec::run()?;
    scenarios::requests::run(&service, &rx, &target)?;

    service.release();
    Ok(())
}
