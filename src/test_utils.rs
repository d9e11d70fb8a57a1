//! Shared helpers for unit tests.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::translate::interface::{TranslateError, Translation, Translator};

type Respond = dyn Fn(&str, &str) -> Result<String, TranslateError> + Send + Sync;

/// In-memory [`Translator`] that records every text it is asked to translate.
pub struct StubTranslator {
    respond: Box<Respond>,
    calls: Mutex<Vec<String>>,
}

impl StubTranslator {
    /// `respond` receives the source text and the target language code.
    pub fn new(respond: impl Fn(&str, &str) -> Result<String, TranslateError> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn prefixing(prefix: &'static str) -> Self {
        Self::new(move |text, _| Ok(format!("{}{}", prefix, text)))
    }

    /// Returns every text unchanged, like a service that already agrees with the source.
    pub fn echo() -> Self {
        Self::new(|text, _| Ok(text.to_string()))
    }

    /// Fails every call with an HTTP 500.
    pub fn failing() -> Self {
        Self::new(|_, _| {
            Err(TranslateError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "stubbed failure".to_string(),
            })
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for StubTranslator {
    async fn translate(&self, text: &str, _from: &str, to: &str) -> Result<String, TranslateError> {
        self.calls.lock().unwrap().push(text.to_string());
        (self.respond)(text, to)
    }

    async fn translate_many(
        &self,
        text: &str,
        _from: &str,
        targets: &[String],
    ) -> Result<Vec<Translation>, TranslateError> {
        self.calls.lock().unwrap().push(text.to_string());
        targets
            .iter()
            .map(|to| {
                (self.respond)(text, to).map(|translated| Translation {
                    text: translated,
                    to: to.clone(),
                })
            })
            .collect()
    }
}

/// XLIFF document with units in every state the localizer cares about.
pub const SAMPLE_XLIFF: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
  <file datatype="xml" source-language="en-US" target-language="fr-FR" original="App">
    <body>
      <group id="App">
        <trans-unit id="Greeting" translate="yes" xml:space="preserve">
          <source>Hello</source>
          <target state="new">Hello</target>
        </trans-unit>
        <trans-unit id="Farewell" translate="yes" xml:space="preserve">
          <source>Goodbye</source>
          <target state="translated">Au revoir</target>
        </trans-unit>
        <trans-unit id="Save" translate="yes" xml:space="preserve">
          <source>Save</source>
          <target state="new">Save</target>
        </trans-unit>
        <trans-unit id="Blank" translate="yes" xml:space="preserve">
          <source></source>
          <target state="new"></target>
        </trans-unit>
        <trans-unit id="Review" translate="yes" xml:space="preserve">
          <source>Open</source>
          <target state="needs-review-translation">Ouvrir</target>
        </trans-unit>
      </group>
    </body>
  </file>
</xliff>
"#;
