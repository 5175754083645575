use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use tracing::debug;

use courier_types::{Disposition, DispositionModifier, MdnData, TransportHeaders};

use crate::error::MdnError;
use crate::mime::{MimePart, Multipart};
use crate::sign::MdnSigner;

/// `Reporting-UA` value announced in every MDN.
pub const REPORTING_UA: &str = "Courier";

/// Rendered in place of the recipient system id when the original
/// message did not carry one.
const UNKNOWN_SYSTEM_ID: &str = "<unknown AS2 system id>";

const CRLF: &str = "\r\n";

/// Builds signed Message Disposition Notifications.
///
/// Reads nothing from disk; the signing capability is supplied once at
/// construction and shared read-only across concurrent calls.
pub struct MdnFactory {
    signer: Arc<dyn MdnSigner>,
}

impl MdnFactory {
    pub fn new(signer: Arc<dyn MdnSigner>) -> Self {
        Self { signer }
    }

    /// Assemble the two-part disposition report for `mdn` and sign it.
    ///
    /// `received_headers` are the transport headers of the original
    /// message; every one of them is echoed in the human-readable part.
    pub fn create_mdn(
        &self,
        mdn: &MdnData,
        received_headers: &TransportHeaders,
    ) -> Result<SignedMdn, MdnError> {
        validate(mdn)?;

        let human_readable = human_readable_part(mdn, received_headers);
        let machine_readable = machine_readable_part(mdn);

        let mut report = Multipart::new("report; report-type=disposition-notification");
        report.push(human_readable);
        report.push(machine_readable);
        let report_part = report.into_part();

        // The signature covers the report part exactly as transmitted,
        // headers included.
        let signed_content = report_part.render();
        let signature = self.signer.sign(&signed_content)?;
        debug!(
            "Signed MDN report for message {} ({} signature bytes)",
            mdn.message_id,
            signature.len()
        );

        let signature_part = MimePart::new(
            "application/pkcs7-signature; name=smime.p7s; smime-type=signed-data",
            BASE64.encode(&signature),
        )
        .with_header("Content-Transfer-Encoding", "base64")
        .with_header("Content-Disposition", "attachment; filename=\"smime.p7s\"")
        .with_header("Content-Description", "S/MIME Cryptographic Signature");

        let mut envelope = Multipart::new(&format!(
            "signed; protocol=\"application/pkcs7-signature\"; micalg={}",
            self.signer.micalg()
        ));
        envelope.push(report_part);
        envelope.push(signature_part);

        Ok(SignedMdn {
            content_type: envelope.content_type(),
            body: envelope.render_body(),
            signed_content,
            signature,
        })
    }
}

/// The final wire object: a detached-signature envelope wrapping the
/// two-part disposition report. Immutable once produced.
#[derive(Debug, Clone)]
pub struct SignedMdn {
    content_type: String,
    body: Vec<u8>,
    signed_content: Vec<u8>,
    signature: Vec<u8>,
}

impl SignedMdn {
    /// `multipart/signed; ...` value for the transport's Content-Type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The multipart body to transmit alongside [`Self::content_type`].
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Exact bytes the signature was computed over.
    pub fn signed_content(&self) -> &[u8] {
        &self.signed_content
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The full entity, Content-Type header included, for logging or
    /// store-and-forward transports.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 128);
        out.extend_from_slice(format!("Content-Type: {}{CRLF}", self.content_type).as_bytes());
        out.extend_from_slice(format!("MIME-Version: 1.0{CRLF}{CRLF}").as_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

fn validate(mdn: &MdnData) -> Result<(), MdnError> {
    if mdn.message_id.as_str().is_empty() {
        return Err(MdnError::Assembly("message id is empty".into()));
    }
    if mdn.subject.is_empty() {
        return Err(MdnError::Assembly("subject is empty".into()));
    }
    Ok(())
}

/// The narrative part peers show to humans. The exact phrasing is
/// protocol-visible: peers parse this free text, so the wording below
/// (including "with a failed.") must not be reworded.
fn human_readable_part(mdn: &MdnData, received_headers: &TransportHeaders) -> MimePart {
    let mut text = String::from("The following headers were received:\n");
    for (name, value) in received_headers.iter() {
        text.push_str(name);
        text.push_str(": ");
        text.push_str(value);
        text.push('\n');
    }
    text.push('\n');

    let as2_to = mdn.as2_to.as_deref().unwrap_or(UNKNOWN_SYSTEM_ID);
    text.push_str(&format!(
        "The message sent to AS2 System id {} on {} with subject {} has been received.",
        as2_to,
        mdn.date.to_rfc2822(),
        mdn.subject
    ));

    match &mdn.disposition {
        Disposition::Processed(modifier) => {
            text.push_str(" It has been processed ");
            match modifier {
                None => text.push_str("successfully."),
                Some(modifier) => {
                    match modifier {
                        DispositionModifier::Warning(_) => text.push_str("with a warning."),
                        DispositionModifier::Error(_) => text.push_str(
                            "with an error. Henceforth the message will NOT be delivered.",
                        ),
                        DispositionModifier::Failed(_) => text.push_str(
                            "with a failed. Henceforth the message will NOT be delivered.",
                        ),
                    }
                    text.push_str("The warning/error message is:\n");
                    text.push_str(modifier.text());
                }
            }
        }
        Disposition::Failed(failure) => {
            text.push('\n');
            text.push_str(failure);
        }
    }

    MimePart::new("text/plain", text).with_header("Content-Transfer-Encoding", "7bit")
}

/// The machine-readable disposition fields. Field order is fixed for
/// interoperability and must not change.
fn machine_readable_part(mdn: &MdnData) -> MimePart {
    let as2_to = mdn.as2_to.as_deref().unwrap_or(UNKNOWN_SYSTEM_ID);
    let recipient = format!("rfc822; {as2_to}");

    let mut fields = String::new();
    let mut field = |name: &str, value: &str| {
        fields.push_str(name);
        fields.push_str(": ");
        fields.push_str(value);
        fields.push_str(CRLF);
    };

    field("Reporting-UA", REPORTING_UA);
    field("Disposition", &mdn.disposition.to_string());
    field("Original-Recipient", &recipient);
    field("Final-Recipient", &recipient);
    field("Original-Message-ID", mdn.message_id.as_str());
    if let Some(mic) = &mdn.mic {
        field("Received-Content-MIC", &mic.to_string());
    }

    MimePart::new("message/disposition-notification", fields)
        .with_header("Content-Transfer-Encoding", "7bit")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use courier_types::Mic;

    use crate::sign::{Ed25519Signer, SigningCredentials};
    use ed25519_dalek::SigningKey;

    fn factory() -> MdnFactory {
        let key = SigningKey::from_bytes(&[9u8; 32]);
        let signer = Ed25519Signer::new(SigningCredentials::new(key, b"cert".to_vec()));
        MdnFactory::new(Arc::new(signer))
    }

    fn mdn_data(disposition: Disposition) -> MdnData {
        MdnData::new(
            "msg-42",
            "peer-sender",
            Some("peer-receiver".to_owned()),
            "Invoice 2026-117",
            Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
            disposition,
        )
    }

    fn human_text(mdn: &MdnData, headers: &TransportHeaders) -> String {
        let part = human_readable_part(mdn, headers);
        String::from_utf8(part.body().to_vec()).unwrap()
    }

    #[test]
    fn narrative_for_success() {
        let text = human_text(&mdn_data(Disposition::processed()), &TransportHeaders::new());
        assert!(text.ends_with("has been received. It has been processed successfully."));
    }

    #[test]
    fn narrative_for_warning_carries_the_warning_text() {
        let text = human_text(
            &mdn_data(Disposition::processed_with_warning("slow")),
            &TransportHeaders::new(),
        );
        let warning_pos = text.find("with a warning.").unwrap();
        let detail_pos = text.find("slow").unwrap();
        assert!(warning_pos < detail_pos);
        assert!(text.contains("The warning/error message is:\nslow"));
    }

    #[test]
    fn narrative_for_error_announces_non_delivery() {
        let text = human_text(
            &mdn_data(Disposition::processed_with_error("schema violation")),
            &TransportHeaders::new(),
        );
        assert!(
            text.contains("with an error. Henceforth the message will NOT be delivered.")
        );
        assert!(text.contains("schema violation"));
    }

    #[test]
    fn narrative_for_processed_failed_keeps_legacy_wording() {
        let mdn = mdn_data(Disposition::Processed(Some(DispositionModifier::Failed(
            "rejected".to_owned(),
        ))));
        let text = human_text(&mdn, &TransportHeaders::new());
        assert!(text.contains("with a failed. Henceforth the message will NOT be delivered."));
    }

    #[test]
    fn narrative_for_outer_failure_has_no_processed_sentence() {
        let text = human_text(
            &mdn_data(Disposition::failed("bad signature")),
            &TransportHeaders::new(),
        );
        assert!(text.contains("bad signature"));
        assert!(!text.contains("has been processed"));
    }

    #[test]
    fn narrative_echoes_received_headers() {
        let headers: TransportHeaders =
            [("AS2-From", "peer-sender"), ("Message-ID", "msg-42")]
                .into_iter()
                .collect();
        let text = human_text(&mdn_data(Disposition::processed()), &headers);
        assert!(text.starts_with(
            "The following headers were received:\nAS2-From: peer-sender\nMessage-ID: msg-42\n"
        ));
    }

    #[test]
    fn missing_recipient_uses_placeholder() {
        let mut mdn = mdn_data(Disposition::processed());
        mdn.as2_to = None;
        let text = human_text(&mdn, &TransportHeaders::new());
        assert!(text.contains("The message sent to AS2 System id <unknown AS2 system id> on"));
    }

    #[test]
    fn machine_fields_in_fixed_order() {
        let mdn = mdn_data(Disposition::processed())
            .with_mic(Mic::new("eeWNkOTx7yJYr2EW8CR85I7QJQY=", "sha1"));
        let part = machine_readable_part(&mdn);
        let body = String::from_utf8(part.body().to_vec()).unwrap();

        let expected = [
            "Reporting-UA: Courier",
            "Disposition: automatic-action/MDN-sent-automatically; processed",
            "Original-Recipient: rfc822; peer-receiver",
            "Final-Recipient: rfc822; peer-receiver",
            "Original-Message-ID: msg-42",
            "Received-Content-MIC: eeWNkOTx7yJYr2EW8CR85I7QJQY=, sha1",
        ];
        let lines: Vec<&str> = body.split(CRLF).filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, expected);
    }

    #[test]
    fn mic_field_is_omitted_when_absent() {
        let part = machine_readable_part(&mdn_data(Disposition::processed()));
        let body = String::from_utf8(part.body().to_vec()).unwrap();
        assert!(!body.contains("Received-Content-MIC"));
    }

    #[test]
    fn empty_message_id_is_an_assembly_error() {
        let mut mdn = mdn_data(Disposition::processed());
        mdn.message_id = "".into();
        let err = factory()
            .create_mdn(&mdn, &TransportHeaders::new())
            .unwrap_err();
        assert!(matches!(err, MdnError::Assembly(_)));
    }

    #[test]
    fn envelope_content_types() {
        let signed = factory()
            .create_mdn(&mdn_data(Disposition::processed()), &TransportHeaders::new())
            .unwrap();

        assert!(signed.content_type().starts_with(
            "multipart/signed; protocol=\"application/pkcs7-signature\"; micalg=sha-256"
        ));
        let body = String::from_utf8(signed.body().to_vec()).unwrap();
        assert!(body.contains("multipart/report; report-type=disposition-notification"));
        assert!(body.contains("Content-Type: message/disposition-notification"));
        assert!(body.contains("filename=\"smime.p7s\""));
    }
}
