use entity_http_client::{decode, encode};

use crate::{Note, Priority};

pub fn run() -> Result<(), String> {
    println!("Scenario: codec");

    let note = Note {
        id: 1,
        title: "Water the plants".to_string(),
        priority: Priority::High,
        tags: vec![],
    };
    let text = encode(&note).map_err(|e| e.to_string())?;
    println!("Encoded: {}", text);

    let decoded: Note = decode(r#"{"id":2,"priority":"low","tags":["home",3,"garden"]}"#)
        .map_err(|e| e.to_string())?;
    println!("Decoded: {:?}", decoded);

    match decode::<Note>(r#"{"priority":"urgent"}"#) {
        Ok(_) => return Err("Expected an unknown priority to fail".to_string()),
        Err(e) => println!("Rejected: {}", e),
    }

    Ok(())
}
