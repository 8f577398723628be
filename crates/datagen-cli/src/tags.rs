//! Tag providers.

use datagen_core::{Fingerprint, TagError, TagKind, TagSet};
use tracing::debug;

use crate::output::{OutputSink, PassReport, WriteError};
use crate::provider::{DataProvider, ProviderError};

/// Declares the tags of one registry for one mod.
pub trait TagsProvider {
    /// Identifier of the mod declaring the tags.
    fn mod_id(&self) -> &str;

    /// Registry the tags group.
    fn kind(&self) -> TagKind;

    /// Declares every tag into `tags`.
    fn add_tags(&self, tags: &mut TagSet) -> Result<(), TagError>;
}

/// Runs a [`TagsProvider`] as a [`DataProvider`], writing one JSON file per
/// tag under `data/<namespace>/tags/<registry>/`.
#[derive(Debug)]
pub struct TagOutputs<P>(pub P);

impl<P: TagsProvider> DataProvider for TagOutputs<P> {
    fn name(&self) -> String {
        format!("{}: {}", self.0.kind().default_name(), self.0.mod_id())
    }

    fn run(&self, sink: &mut OutputSink) -> Result<PassReport, ProviderError> {
        let mut tags = TagSet::new();
        self.0.add_tags(&mut tags)?;

        let folder = self.0.kind().folder();
        let mut report = PassReport::default();
        for (id, builder) in tags.iter() {
            let output = id.tag_output_path(folder);
            let json = builder
                .to_json()
                .map_err(|e| ProviderError::Other(format!("couldn't serialize tag {}: {}", id, e)))?;
            let fingerprint = Fingerprint::of_bytes(&json);
            debug!(%id, entries = builder.values().len(), "declared tag");

            let status = sink.save(&output, fingerprint, || Ok::<_, WriteError>(json));
            report.push(output, status);
        }

        Ok(report)
    }
}
