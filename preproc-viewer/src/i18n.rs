//! Localised log panel messages.
//!
//! Catalogues are embedded Fluent resources. A lookup tries the requested
//! locale, then English, then falls back to the message key itself.

use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};
use unic_langid::LanguageIdentifier;

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid locale '{locale}'")]
    InvalidLocale { locale: String },

    #[error("{count} Fluent syntax error(s) in the {locale} catalogue")]
    Syntax { locale: String, count: usize },

    #[error("{count} message(s) defined twice in the {locale} catalogue")]
    Duplicate { locale: String, count: usize },
}

/// Message catalogues keyed by canonical language tag
pub struct I18n {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl I18n {
    /// Catalogues for the bundled locales (`en`, `pt-BR`)
    pub fn new() -> Self {
        let mut i18n = Self {
            bundles: HashMap::new(),
        };

        for (locale, content) in [("en", EN_MESSAGES), ("pt-BR", PT_BR_MESSAGES)] {
            if let Err(e) = i18n.add_catalogue(locale, content) {
                warn!(locale = %locale, error = %e, "Failed to load embedded messages");
            }
        }

        i18n
    }

    pub fn add_catalogue(&mut self, locale: &str, content: &str) -> Result<(), CatalogError> {
        let lang_id: LanguageIdentifier =
            locale.parse().map_err(|_| CatalogError::InvalidLocale {
                locale: locale.to_string(),
            })?;

        let resource = FluentResource::try_new(content.to_string()).map_err(|(_, errors)| {
            CatalogError::Syntax {
                locale: locale.to_string(),
                count: errors.len(),
            }
        })?;

        let tag = lang_id.to_string();
        let mut bundle = FluentBundle::new_concurrent(vec![lang_id]);
        // Log lines are plain text, bidi isolation marks only get in the way
        bundle.set_use_isolating(false);
        bundle
            .add_resource(resource)
            .map_err(|errors| CatalogError::Duplicate {
                locale: locale.to_string(),
                count: errors.len(),
            })?;

        debug!(locale = %tag, "Loaded message catalogue");
        self.bundles.insert(tag, bundle);
        Ok(())
    }

    /// Best bundled match for `requested`: the exact tag, then any catalogue
    /// of the same language, then the default locale
    pub fn resolve_locale(&self, requested: &str) -> String {
        let Ok(wanted) = requested.replace('_', "-").parse::<LanguageIdentifier>() else {
            warn!(locale = %requested, "Unparseable locale, using {}", DEFAULT_LOCALE);
            return DEFAULT_LOCALE.to_string();
        };

        let exact = wanted.to_string();
        if self.bundles.contains_key(&exact) {
            return exact;
        }

        let mut same_language: Vec<&String> = self
            .bundles
            .keys()
            .filter(|tag| {
                tag.parse::<LanguageIdentifier>()
                    .is_ok_and(|id| id.language == wanted.language)
            })
            .collect();
        same_language.sort();

        match same_language.first() {
            Some(tag) => (*tag).clone(),
            None => {
                debug!(locale = %requested, "No catalogue for locale, using {}", DEFAULT_LOCALE);
                DEFAULT_LOCALE.to_string()
            }
        }
    }

    /// Format message `key` with named arguments
    pub fn format(&self, locale: &str, key: &str, args: &[(&str, &str)]) -> String {
        let fluent_args = (!args.is_empty()).then(|| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, *value);
            }
            fluent_args
        });

        [locale, DEFAULT_LOCALE]
            .into_iter()
            .find_map(|tag| self.render(tag, key, fluent_args.as_ref()))
            .unwrap_or_else(|| key.to_string())
    }

    fn render(&self, locale: &str, key: &str, args: Option<&FluentArgs>) -> Option<String> {
        let bundle = self.bundles.get(locale)?;
        let pattern = bundle.get_message(key)?.value()?;

        let mut errors = vec![];
        let text = bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            warn!(key = %key, locale = %locale, errors = ?errors, "Fluent formatting errors");
        }

        Some(text.into_owned())
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new()
    }
}

const EN_MESSAGES: &str = r#"
# Rendering engine
engine-waiting = Waiting for the PDF rendering engine...
engine-ready = PDF rendering engine ready
engine-unavailable = PDF rendering engine unavailable: { $reason }

# Upload
upload-no-file = Select a PDF
upload-sending = Uploading PDF...
upload-failed = Upload failed: { $error }
upload-failed-alert = Upload failed
upload-ok = Upload OK. file_id={ $file_id } filename={ $filename }
upload-known-content = This PDF is already stored as { $filename } (file_id={ $file_id })

# Page viewer
viewer-loading = Loading PDF into the viewer from { $url }
viewer-rendered = PDF rendered: { $pages } page(s).
viewer-load-failed = Could not load the PDF into the viewer: { $error }
viewer-page-failed = Could not render page { $page }: { $error }

# Extraction
extract-no-file = No file_id, upload a PDF first.
extract-starting = Starting extraction...
extract-failed = Extraction failed: { $error }
extract-done = Extraction finished. Pages={ $pages } Tables={ $tables }
extract-download-ready = Artifacts ready for download: { $url }
extract-file-mismatch = Result belongs to file_id={ $result_file_id }, expected { $file_id }
download-saved = Artifacts saved to { $path }
download-failed = Failed to download artifacts: { $error }

# Stored files
catalog-failed = Failed to list stored files: { $error }
catalog-loaded = Listed { $count } stored file(s)
catalog-no-selection = Select a file
catalog-loading = Loading from database: { $file_id }
catalog-load-failed = Failed to load: { $error }

# Image descriptions
captions-no-extract = No extraction loaded.
captions-describe-starting = Descriptions: starting...
captions-describe-failed = Failed to describe images: { $error }
captions-describe-done = Descriptions processed: { $count } new descriptions generated
captions-describe-cached = All images were already described (reusing cache)
captions-describe-generated = { $count } new descriptions were generated and saved
captions-loading = Loading existing descriptions...
captions-load-failed = Could not load descriptions: { $status }
captions-loaded = Loaded { $count } image descriptions
captions-empty = No descriptions found. Use "Describe images" to generate them.

# Requests
request-stale = Discarded a stale response for file_id={ $file_id }
"#;

const PT_BR_MESSAGES: &str = r#"
engine-waiting = Aguardando o mecanismo de renderização de PDF...
engine-ready = Mecanismo de renderização de PDF pronto
engine-unavailable = Mecanismo de renderização de PDF indisponível: { $reason }

upload-no-file = Selecione um PDF
upload-sending = Enviando PDF...
upload-failed = Falha no upload: { $error }
upload-failed-alert = Falha no upload
upload-ok = Upload OK. file_id={ $file_id } filename={ $filename }
upload-known-content = Este PDF já está armazenado como { $filename } (file_id={ $file_id })

viewer-loading = Carregando PDF no viewer a partir de { $url }
viewer-rendered = PDF renderizado: { $pages } página(s).
viewer-load-failed = Não foi possível carregar o PDF no viewer: { $error }
viewer-page-failed = Não foi possível renderizar a página { $page }: { $error }

extract-no-file = Sem fileId, faça upload primeiro.
extract-starting = Iniciando extração...
extract-failed = Falha na extração: { $error }
extract-done = Extração concluída. Páginas={ $pages } Tabelas={ $tables }
extract-download-ready = Artefatos prontos para download: { $url }
extract-file-mismatch = Resultado pertence ao file_id={ $result_file_id }, esperado { $file_id }
download-saved = Artefatos salvos em { $path }
download-failed = Falha ao baixar artefatos: { $error }

catalog-failed = Falha ao listar arquivos do banco: { $error }
catalog-loaded = { $count } arquivo(s) no banco
catalog-no-selection = Selecione um arquivo
catalog-loading = Carregando do banco: { $file_id }
catalog-load-failed = Falha ao carregar: { $error }

captions-no-extract = Não há extração carregada.
captions-describe-starting = Descrições: iniciando...
captions-describe-failed = Falha ao descrever imagens: { $error }
captions-describe-done = Descrições processadas: { $count } novas descrições geradas
captions-describe-cached = Todas as imagens já foram descritas anteriormente (reutilizando cache)
captions-describe-generated = { $count } novas descrições foram geradas e salvas
captions-loading = Carregando descrições existentes...
captions-load-failed = Não foi possível carregar descrições: { $status }
captions-loaded = Carregadas { $count } descrições de imagens
captions-empty = Nenhuma descrição encontrada. Use "Descrever imagens" para gerar.

request-stale = Resposta obsoleta descartada para file_id={ $file_id }
"#;
