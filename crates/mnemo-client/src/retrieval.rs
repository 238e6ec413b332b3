//! Typed retrieval operations.
//!
//! The four public operations — index tools, search tools, index memory,
//! search memories — plus the protected clear. Per the client's resilience
//! policy they degrade to empty results or no-ops whenever the service is
//! not ready or a request fails; the only errors surfaced are validation
//! failures, raised before any network call.

use chrono::Utc;
use tracing::{debug, warn};

use mnemo_types::{
    DEFAULT_MIN_SCORE, DEFAULT_TOP_K, MemoryContext, MemoryDocument, SearchRequest, TOOLS,
    ToolDescriptor, is_protected, namespace, validate_namespace, validate_tools,
};

use crate::client::RetrievalClient;
use crate::error::Result;
use crate::scoring;

/// top_k used to fetch every indexed tool for the re-index diff.
const FETCH_ALL_TOP_K: usize = 1000;

/// Result bundle of a tool search.
#[derive(Debug, Clone, Default)]
pub struct ToolSearchBundle {
    /// Matched descriptors: semantic hits by descending score, then
    /// keyword-fallback matches.
    pub tools: Vec<ToolDescriptor>,
    /// `name: description` lines for logging and UI.
    pub descriptions: String,
    /// Prompt fragment enumerating the matched tools and the calling
    /// convention.
    pub raw_prompt: String,
}

impl ToolSearchBundle {
    /// Whether the search matched anything.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// One memory returned by [`RetrievalClient::relevant_memories`].
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    /// Document id within its namespace.
    pub id: String,
    /// Namespace the memory came from.
    pub namespace: String,
    /// The memory text.
    pub text: String,
    /// Raw cosine score.
    pub score: f32,
    /// Boosted relevance in `[0, 1]`; result ordering key.
    pub relevance: f32,
    /// Structured memory context.
    pub context: MemoryContext,
}

impl RetrievalClient {
    /// Index the registry's tool descriptors, re-embedding only what
    /// changed.
    ///
    /// The currently indexed set is fetched and diffed against `tools` by
    /// description, parameters, and keywords; unchanged tools cost no
    /// embedding work. Returns the number of tools actually sent. Not
    /// ready ⇒ `Ok(0)`.
    pub async fn index_tools(&self, tools: &[ToolDescriptor]) -> Result<usize> {
        validate_tools(tools)?;

        let Some(service) = self.service() else {
            debug!("index_tools before ready; skipping");
            return Ok(0);
        };

        // Fetch-all search against the tools namespace; a failure here
        // just means everything gets re-indexed.
        let indexed = match service
            .search(&SearchRequest {
                namespaces: vec![TOOLS.to_string()],
                query: "tool".to_string(),
                top_k: FETCH_ALL_TOP_K,
                min_score: 0.0,
            })
            .await
        {
            Ok(response) => response
                .results
                .into_iter()
                .flat_map(|ns| ns.hits)
                .map(|hit| (hit.id, hit.context))
                .collect(),
            Err(e) => {
                warn!(error = %e, "could not fetch indexed tools; re-indexing all");
                std::collections::HashMap::new()
            }
        };

        let changed: Vec<_> = tools
            .iter()
            .filter(|tool| {
                indexed
                    .get(&tool.name)
                    .is_none_or(|context| !tool.matches_context(context))
            })
            .collect();

        if !changed.is_empty() {
            let documents = changed.iter().map(|t| t.to_document()).collect();
            match service.index(TOOLS, documents).await {
                Ok(response) => {
                    if !response.failed.is_empty() {
                        warn!(failed = ?response.failed, "some tools failed to index");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "tool indexing failed");
                    return Ok(0);
                }
            }
        }

        debug!(total = tools.len(), changed = changed.len(), "tool index refreshed");

        // Cache every descriptor for hit resolution and keyword fallback.
        let mut cache = self.inner.tools.write();
        cache.clear();
        for tool in tools {
            cache.insert(tool.name.clone(), tool.clone());
        }

        Ok(changed.len())
    }

    /// Search for tools relevant to a query.
    ///
    /// Semantic hits resolve back to cached descriptors by id; tools whose
    /// keywords lexically match the query are unioned in, catching
    /// near-misses the embedding ranked below `min_score`. Not ready or
    /// request failure ⇒ keyword matches only (possibly empty).
    pub async fn search_tools(
        &self,
        query: &str,
        top_k: usize,
        min_score: f32,
    ) -> ToolSearchBundle {
        let semantic_ids: Vec<String> = match self.service() {
            Some(service) => {
                match service
                    .search(&SearchRequest {
                        namespaces: vec![TOOLS.to_string()],
                        query: query.to_string(),
                        top_k,
                        min_score,
                    })
                    .await
                {
                    Ok(response) => response
                        .results
                        .into_iter()
                        .flat_map(|ns| ns.hits)
                        .map(|hit| hit.id)
                        .collect(),
                    Err(e) => {
                        warn!(error = %e, "tool search failed; falling back to keywords");
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        let cache = self.inner.tools.read();
        let mut tools: Vec<ToolDescriptor> = Vec::new();

        for id in &semantic_ids {
            if let Some(tool) = cache.get(id) {
                tools.push(tool.clone());
            }
        }

        // Keyword fallback, deterministic order.
        let mut keyword_hits: Vec<&ToolDescriptor> = cache
            .values()
            .filter(|t| t.matches_query(query) && !tools.iter().any(|m| m.name == t.name))
            .collect();
        keyword_hits.sort_by(|a, b| a.name.cmp(&b.name));
        tools.extend(keyword_hits.into_iter().cloned());

        drop(cache);

        let descriptions = tools
            .iter()
            .map(|t| format!("- {}: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n");

        let raw_prompt = if tools.is_empty() {
            String::new()
        } else {
            build_tool_prompt(&tools)
        };

        debug!(query, matched = tools.len(), "tool search");

        ToolSearchBundle {
            tools,
            descriptions,
            raw_prompt,
        }
    }

    /// Search for tools with the default limits.
    pub async fn search_tools_default(&self, query: &str) -> ToolSearchBundle {
        self.search_tools(query, DEFAULT_TOP_K, DEFAULT_MIN_SCORE).await
    }

    /// Index one memory, routing it by its metadata kind.
    ///
    /// Stamps the creation timestamp when absent. Malformed memories are
    /// rejected before any network call; transport failures are logged and
    /// swallowed. Not ready ⇒ no-op.
    pub async fn index_memory(&self, mut memory: MemoryDocument) -> Result<()> {
        if memory.context.timestamp.is_none() {
            memory.context.timestamp = Some(Utc::now());
        }

        let document = memory.to_document();
        mnemo_types::validate_document(&document)?;

        let Some(service) = self.service() else {
            debug!("index_memory before ready; dropping");
            return Ok(());
        };

        let ns = memory.namespace();
        if let Err(e) = service.index(ns, vec![document]).await {
            warn!(namespace = ns, error = %e, "memory indexing failed");
        }
        Ok(())
    }

    /// Search all memory namespaces and return the `top_k` most relevant
    /// memories.
    ///
    /// Each namespace is searched independently; raw scores below the
    /// namespace's floor are dropped, expired volatile memories are
    /// filtered, and the rest are ranked by boosted relevance
    /// (`min(1.0, score × recency × importance)`). Not ready or request
    /// failure ⇒ empty.
    pub async fn relevant_memories(&self, query: &str, top_k: usize) -> Vec<ScoredMemory> {
        let Some(service) = self.service() else {
            return Vec::new();
        };

        let response = match service
            .search(&SearchRequest {
                namespaces: namespace::MEMORY_NAMESPACES
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                query: query.to_string(),
                top_k,
                min_score: 0.0,
            })
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "memory search failed");
                return Vec::new();
            }
        };

        let now = Utc::now();
        let mut memories: Vec<ScoredMemory> = Vec::new();

        for ns_hits in response.results {
            let floor = scoring::min_score_for(&ns_hits.namespace);
            for hit in ns_hits.hits {
                if hit.score < floor {
                    continue;
                }
                let context = MemoryDocument::context_from_hit(&hit.context);
                if context.is_expired(now) {
                    continue;
                }
                let relevance = scoring::relevance(
                    hit.score,
                    context.timestamp,
                    context.metadata.importance,
                    now,
                );
                memories.push(ScoredMemory {
                    id: hit.id,
                    namespace: ns_hits.namespace.clone(),
                    text: hit.text,
                    score: hit.score,
                    relevance,
                    context,
                });
            }
        }

        memories.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        memories.truncate(top_k);

        debug!(query, matched = memories.len(), "memory search");
        memories
    }

    /// Clear a namespace.
    ///
    /// Protected namespaces (deliberately kept memories) are refused with
    /// a warning and left untouched. Not ready ⇒ no-op.
    pub async fn clear_namespace(&self, ns: &str) -> Result<()> {
        validate_namespace(ns)?;

        if is_protected(ns) {
            warn!(namespace = ns, "refusing to clear protected namespace");
            return Ok(());
        }

        let Some(service) = self.service() else {
            return Ok(());
        };

        if let Err(e) = service.clear(ns).await {
            warn!(namespace = ns, error = %e, "clear failed");
        }
        Ok(())
    }
}

/// Render the tool-call prompt fragment for a set of matched tools.
fn build_tool_prompt(tools: &[ToolDescriptor]) -> String {
    let mut prompt = String::from("You have access to these tools:\n");

    for tool in tools {
        prompt.push_str(&format!("\n### {}\n{}\n", tool.name, tool.description));
        if tool.parameters.as_object().is_some_and(|o| !o.is_empty()) {
            let schema = serde_json::to_string_pretty(&tool.parameters)
                .unwrap_or_else(|_| "{}".to_string());
            prompt.push_str(&format!("Parameters:\n{schema}\n"));
        }
    }

    prompt.push_str(
        "\nWhen a tool is needed, reply with exactly one JSON object and nothing else:\n\
         {\"tool\": \"<tool_name>\", \"arguments\": {<parameters>}}\n\
         Do not wrap the JSON in markdown fences or add commentary. \
         If no tool is needed, answer the user directly.\n",
    );

    prompt
}
