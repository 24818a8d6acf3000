//! Projections of a reconstructed document

use yrs::{Doc, GetString, ReadTxn, StateVector, Transact};

/// Root text field holding the diagram source.
pub const DEFAULT_TEXT_FIELD: &str = "content";

/// Plain text of the root text `field`, empty if the field does not exist.
pub fn text_content(doc: &Doc, field: &str) -> String {
	let txn = doc.transact();
	txn.get_text(field).map(|text| text.get_string(&txn)).unwrap_or_default()
}

/// Full document state as a single v1 update.
pub fn encode_state(doc: &Doc) -> Vec<u8> {
	doc.transact().encode_state_as_update_v1(&StateVector::default())
}

#[cfg(test)]
mod tests {
	use super::*;
	use yrs::Text;

	#[test]
	fn test_missing_field_is_empty() {
		let doc = Doc::new();
		assert_eq!(text_content(&doc, DEFAULT_TEXT_FIELD), "");
	}

	#[test]
	fn test_reads_named_field() {
		let doc = Doc::new();
		let text = doc.get_or_insert_text("content");
		let other = doc.get_or_insert_text("other");
		text.insert(&mut doc.transact_mut(), 0, "@startuml\nA -> B\n@enduml");
		other.insert(&mut doc.transact_mut(), 0, "ignored");

		assert_eq!(text_content(&doc, "content"), "@startuml\nA -> B\n@enduml");
		assert_eq!(text_content(&doc, "other"), "ignored");
	}

	#[test]
	fn test_encode_state_restores_text() {
		use yrs::Update;
		use yrs::updates::decoder::Decode;

		let doc = Doc::new();
		let text = doc.get_or_insert_text("content");
		text.insert(&mut doc.transact_mut(), 0, "Bob -> Alice : hi");

		let copy = Doc::new();
		let update = Update::decode_v1(&encode_state(&doc)).expect("decode");
		copy.transact_mut().apply_update(update).expect("apply");
		assert_eq!(text_content(&copy, "content"), "Bob -> Alice : hi");
	}
}

// vim: ts=4
