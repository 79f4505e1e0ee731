//! Fuzzy property search using Tantivy.
//!
//! The index lives in memory and holds one document per property: its id plus
//! the title, description and location text. It starts empty; a background
//! task loads every property at startup (see [`build_index_async`]) and the
//! catalog upserts a property whenever one is created or updated.
//!
//! Queries match each term as a prefix within one edit, so partially typed
//! and slightly misspelled words both hit.

mod indexer;

use std::sync::Arc;

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{
    Field, INDEXED, IndexRecordOption, STORED, Schema, TextFieldIndexing, TextOptions, Value,
};
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::{Mutex, MutexGuard};
use tracing::instrument;

use homestead_core::PropertyId;

use crate::models::Property;

pub use indexer::build_index_async;

/// Maximum number of hits returned by a search.
pub const MAX_RESULTS: usize = 20;

/// Tokens longer than this are dropped at index and query time.
const MAX_TOKEN_LENGTH: usize = 40;

const TOKENIZER: &str = "autocomplete";

/// Schema field handles for the search index.
#[derive(Clone, Copy)]
struct SearchFields {
    id: Field,
    title: Field,
    description: Field,
    location: Field,
}

impl SearchFields {
    const fn text(&self) -> [Field; 3] {
        [self.title, self.description, self.location]
    }
}

struct IndexInner {
    #[allow(dead_code)]
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    fields: SearchFields,
}

/// The property search index. Cheap to clone.
#[derive(Clone)]
pub struct SearchIndex {
    inner: Arc<IndexInner>,
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("num_docs", &self.num_docs())
            .finish_non_exhaustive()
    }
}

impl SearchIndex {
    /// Create a new, empty in-memory index.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Index` if the writer or reader cannot be created.
    pub fn new() -> Result<Self, SearchError> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);

        index.tokenizers().register(
            TOKENIZER,
            TextAnalyzer::builder(SimpleTokenizer::default())
                .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH))
                .filter(LowerCaser)
                .build(),
        );

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| SearchError::Index(format!("Failed to create writer: {e}")))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::Index(format!("Failed to create reader: {e}")))?;

        Ok(Self {
            inner: Arc::new(IndexInner {
                index,
                reader,
                writer: Mutex::new(writer),
                fields,
            }),
        })
    }

    /// Add or replace the document for one property and make it searchable.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Index` if the document cannot be written or committed.
    #[instrument(skip(self, property), fields(property_id = %property.id))]
    pub async fn upsert(&self, property: &Property) -> Result<(), SearchError> {
        let mut writer = self.lock_writer().await;
        self.stage(&writer, property)?;
        self.commit(&mut writer)
    }

    /// Lock the writer. Holding the guard blocks every other index update.
    pub(crate) async fn lock_writer(&self) -> MutexGuard<'_, IndexWriter> {
        self.inner.writer.lock().await
    }

    /// Stage a replacement document for `property`; visible after `commit`.
    pub(crate) fn stage(&self, writer: &IndexWriter, property: &Property) -> Result<(), SearchError> {
        let fields = &self.inner.fields;
        let id = i64::from(property.id.as_i32());

        writer.delete_term(Term::from_field_i64(fields.id, id));
        writer
            .add_document(tantivy::doc!(
                fields.id => id,
                fields.title => property.title.clone().unwrap_or_default(),
                fields.description => property.description.clone().unwrap_or_default(),
                fields.location => property.location.clone().unwrap_or_default()
            ))
            .map_err(|e| SearchError::Index(format!("Failed to add document: {e}")))?;

        Ok(())
    }

    /// Commit staged changes and reload the reader.
    pub(crate) fn commit(&self, writer: &mut IndexWriter) -> Result<(), SearchError> {
        writer
            .commit()
            .map_err(|e| SearchError::Index(format!("Failed to commit index: {e}")))?;
        self.inner
            .reader
            .reload()
            .map_err(|e| SearchError::Index(format!("Failed to reload reader: {e}")))
    }

    /// Search titles, descriptions and locations.
    ///
    /// Returns matching property ids, best match first, at most `limit` of
    /// them. A query with no searchable terms returns nothing.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Query` if the search fails.
    #[instrument(skip(self))]
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<PropertyId>, SearchError> {
        let terms = query_terms(query_str);
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let fields = &self.inner.fields;
        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        for term in &terms {
            for field in fields.text() {
                let term = Term::from_field_text(field, term);

                // Exact hits score by relevance, fuzzy prefix hits widen the net
                subqueries.push((
                    Occur::Should,
                    Box::new(TermQuery::new(term.clone(), IndexRecordOption::WithFreqs)),
                ));
                subqueries.push((
                    Occur::Should,
                    Box::new(FuzzyTermQuery::new_prefix(term, 1, true)),
                ));
            }
        }

        let query = BooleanQuery::new(subqueries);
        let searcher = self.inner.reader.searcher();
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .map_err(|e| SearchError::Query(format!("Search failed: {e}")))?;

        let mut ids = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc = searcher
                .doc::<TantivyDocument>(address)
                .map_err(|e| SearchError::Query(format!("Failed to retrieve doc: {e}")))?;
            let id = doc
                .get_first(fields.id)
                .and_then(|v| v.as_i64())
                .and_then(|id| i32::try_from(id).ok())
                .ok_or_else(|| SearchError::Query("Document without a valid id".to_string()))?;
            ids.push(PropertyId::new(id));
        }

        Ok(ids)
    }

    /// Get the number of documents visible to searches.
    #[must_use]
    pub fn num_docs(&self) -> u64 {
        self.inner.reader.searcher().num_docs()
    }
}

/// Build the schema for the search index.
fn build_schema() -> (Schema, SearchFields) {
    let mut schema_builder = Schema::builder();

    let id = schema_builder.add_i64_field("id", INDEXED | STORED);

    let text_indexing = TextFieldIndexing::default()
        .set_tokenizer(TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let text_options = TextOptions::default().set_indexing_options(text_indexing);

    let title = schema_builder.add_text_field("title", text_options.clone());
    let description = schema_builder.add_text_field("description", text_options.clone());
    let location = schema_builder.add_text_field("location", text_options);

    let fields = SearchFields {
        id,
        title,
        description,
        location,
    };

    (schema_builder.build(), fields)
}

/// Split a query the way the index tokenizer splits documents.
fn query_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && t.len() < MAX_TOKEN_LENGTH)
        .map(str::to_lowercase)
        .collect()
}

/// Search errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Index error: {0}")]
    Index(String),
    #[error("Query error: {0}")]
    Query(String),
}
