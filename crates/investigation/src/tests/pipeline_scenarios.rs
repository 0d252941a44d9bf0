use crate::config::InvestigationConfig;
use crate::embeddings::providers::TrigramProvider;
use crate::pipeline::Investigator;
use crate::testing::{doc, CountingEmbedder, ScriptedLlm, StaticIndex};
use crate::types::{ConfidenceLabel, RetrievalStrategy, REJECTION_MESSAGE};
use crate::vector_index::{IndexedChunk, MemoryIndex, VectorIndex};
use casefile_prompt::PromptLibrary;
use std::collections::HashSet;
use std::sync::Arc;

const GATE_PROMPT: &str = "Determine if the following query";
const EXPAND_PROMPT: &str = "Original question:";
const RERANK_PROMPT: &str = "Rate the relevance";
const REPORT_PROMPT: &str = "Evidence from Case Files";

fn investigator(
    config: &InvestigationConfig,
    llm: Arc<ScriptedLlm>,
    embedder: Arc<CountingEmbedder>,
    index: Arc<dyn VectorIndex>,
) -> Investigator {
    Investigator::new(
        config,
        llm,
        Arc::new(PromptLibrary::builtin().unwrap()),
        embedder,
        index,
    )
}

fn case_documents() -> Vec<crate::types::CandidateDocument> {
    vec![
        doc("exchange_logs.txt_chunk_0", "Hot wallet drained at 02:14 UTC.", 0.92),
        doc("wallet_analysis.txt_chunk_1", "Funds split across 40 addresses.", 0.85),
        doc("doc_7_chunk_2", "Deposits into a mixer within an hour.", 0.80),
        doc("staff_notes.txt_chunk_0", "Cafeteria menu for March.", 0.35),
        doc("chat_logs.txt_chunk_3", "Admin asked about key rotation.", 0.60),
    ]
}

fn full_script() -> ScriptedLlm {
    ScriptedLlm::new()
        .on(EXPAND_PROMPT, r#"["hot wallet withdrawals", "mixer deposits", "admin chat"]"#)
        .on("Document:\nHot wallet drained", "90")
        .on("Document:\nFunds split", "70")
        .on("Document:\nDeposits into a mixer", "80")
        .on("Document:\nCafeteria", "5")
        .on("Document:\nAdmin asked", "60")
        .on(REPORT_PROMPT, "SUMMARY: The hot wallet was drained.")
}

#[tokio::test]
async fn keyword_query_runs_full_pipeline_without_judge() {
    let llm = Arc::new(full_script());
    let embedder = Arc::new(CountingEmbedder::new(32));
    let index = Arc::new(StaticIndex::fixed(case_documents()));

    let investigation = investigator(&InvestigationConfig::default(), llm.clone(), embedder, index)
        .investigate("Which wallet received the stolen funds?")
        .await;

    assert!(investigation.verdict.is_relevant);
    assert_eq!(investigation.verdict.reason, "keyword match");
    assert_eq!(llm.calls_matching(GATE_PROMPT), 0);
    assert_eq!(llm.calls_matching(EXPAND_PROMPT), 1);
    assert_eq!(llm.calls_matching(REPORT_PROMPT), 1);

    assert!(!investigation.report.error);
    assert_eq!(investigation.report.text, "SUMMARY: The hot wallet was drained.");
    assert_eq!(investigation.report.evidence_count, 3);
    assert_eq!(investigation.report.strategy, Some(RetrievalStrategy::MultiStep));
    assert_eq!(investigation.evidence.len(), 3);
}

#[tokio::test]
async fn off_topic_query_is_rejected_before_retrieval() {
    let llm = Arc::new(ScriptedLlm::new().on(
        GATE_PROMPT,
        "The user is asking about weather, not the case.\nIRRELEVANT: This query is not about the crypto hack investigation",
    ));
    let embedder = Arc::new(CountingEmbedder::new(32));
    let index = Arc::new(StaticIndex::fixed(case_documents()));

    let investigation = investigator(
        &InvestigationConfig::default(),
        llm.clone(),
        embedder.clone(),
        index.clone(),
    )
    .investigate("What's the weather in Paris?")
    .await;

    assert!(investigation.is_rejected());
    assert_eq!(embedder.calls(), 0);
    assert_eq!(index.searches(), 0);
    assert_eq!(llm.calls(), 1);

    let report = &investigation.report;
    assert!(report.error);
    assert_eq!(report.is_relevant, Some(false));
    assert_eq!(report.text, REJECTION_MESSAGE);
    assert_eq!(
        report.rejection_reason.as_deref(),
        Some("The user is asking about weather, not the case.")
    );
    assert!(investigation.retrieval.is_none());
    assert!(investigation.evidence.is_empty());
}

#[tokio::test]
async fn multi_step_candidates_are_unique_and_sorted() {
    let llm = Arc::new(full_script());
    let embedder = Arc::new(CountingEmbedder::new(32));
    let index = Arc::new(StaticIndex::scripted(vec![
        Ok(vec![
            doc("doc_7_chunk_2", "Deposits into a mixer within an hour.", 0.76),
            doc("exchange_logs.txt_chunk_0", "Hot wallet drained at 02:14 UTC.", 0.70),
        ]),
        Ok(vec![
            doc("doc_7_chunk_2", "Deposits into a mixer within an hour.", 0.81),
            doc("chat_logs.txt_chunk_3", "Admin asked about key rotation.", 0.55),
        ]),
        Ok(vec![
            doc("exchange_logs.txt_chunk_0", "Hot wallet drained at 02:14 UTC.", 0.65),
            doc("wallet_analysis.txt_chunk_1", "Funds split across 40 addresses.", 0.50),
        ]),
    ]));

    let config = InvestigationConfig {
        top_k_rerank: 10,
        ..Default::default()
    };
    let investigation = investigator(&config, llm, embedder, index)
        .investigate("Trace the laundering path")
        .await;

    let retrieval = investigation.retrieval.expect("retrieval ran");
    let ids: Vec<&str> = retrieval.documents.iter().map(|d| d.id.as_str()).collect();
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());

    let scores: Vec<f32> = retrieval.documents.iter().map(|d| d.vector_score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));

    let mixer = retrieval
        .documents
        .iter()
        .find(|d| d.id == "doc_7_chunk_2")
        .unwrap();
    assert_eq!(mixer.vector_score, 0.81);
    assert_eq!(
        retrieval.expanded_queries,
        Some(vec![
            "hot wallet withdrawals".to_string(),
            "mixer deposits".to_string(),
            "admin chat".to_string()
        ])
    );
}

#[tokio::test]
async fn rerank_scores_follow_fusion_formula() {
    let llm = Arc::new(
        ScriptedLlm::new()
            .on("Document:\nLedger entry", "85")
            .on(REPORT_PROMPT, "report"),
    );
    let embedder = Arc::new(CountingEmbedder::new(32));
    let index = Arc::new(StaticIndex::fixed(vec![doc(
        "ledger.txt_chunk_0",
        "Ledger entry for 500 BTC outflow.",
        0.5,
    )]));

    let config = InvestigationConfig {
        strategy: RetrievalStrategy::SingleStep,
        ..Default::default()
    };
    let investigation = investigator(&config, llm, embedder, index)
        .investigate("Show the ledger outflows")
        .await;

    let evidence = &investigation.evidence[0];
    assert_eq!(evidence.relevance_score, 0.85);
    assert!((evidence.combined_score - 0.71).abs() < 1e-6);
    assert_eq!(evidence.confidence, ConfidenceLabel::High);

    for ranked in &investigation.evidence {
        let expected = 0.4 * ranked.vector_score() + 0.6 * ranked.relevance_score;
        assert!((ranked.combined_score - expected).abs() < 1e-6);
    }
}

#[tokio::test]
async fn evidence_is_truncated_to_rerank_width() {
    let llm = Arc::new(full_script());
    let index = Arc::new(StaticIndex::fixed(case_documents()));
    let config = InvestigationConfig {
        strategy: RetrievalStrategy::SingleStep,
        top_k_rerank: 2,
        ..Default::default()
    };

    let investigation = investigator(&config, llm, Arc::new(CountingEmbedder::new(32)), index)
        .investigate("Summarize the breach")
        .await;

    let ids: Vec<&str> = investigation.evidence.iter().map(|d| d.id()).collect();
    // 0.4*0.92+0.6*0.9 = 0.908, 0.4*0.80+0.6*0.8 = 0.80, 0.4*0.85+0.6*0.7 = 0.76
    assert_eq!(ids, vec!["exchange_logs.txt_chunk_0", "doc_7_chunk_2"]);
    assert_eq!(investigation.evidence[0].confidence, ConfidenceLabel::VeryHigh);
}

#[tokio::test]
async fn empty_retrieval_still_produces_report() {
    let llm = Arc::new(ScriptedLlm::new().on(REPORT_PROMPT, "No evidence found."));
    let index = Arc::new(StaticIndex::fixed(Vec::new()));
    let config = InvestigationConfig {
        strategy: RetrievalStrategy::SingleStep,
        ..Default::default()
    };

    let investigation = investigator(&config, llm.clone(), Arc::new(CountingEmbedder::new(32)), index)
        .investigate("Any suspect identified?")
        .await;

    assert!(investigation.evidence.is_empty());
    assert_eq!(llm.calls_matching(RERANK_PROMPT), 0);
    assert_eq!(investigation.report.evidence_count, 0);
    assert!(!investigation.report.error);
}

#[tokio::test]
async fn identical_collaborators_give_identical_results() {
    let mut runs = Vec::new();
    for _ in 0..2 {
        let investigation = investigator(
            &InvestigationConfig::default(),
            Arc::new(full_script()),
            Arc::new(CountingEmbedder::new(32)),
            Arc::new(StaticIndex::fixed(case_documents())),
        )
        .investigate("Trace the hacker's wallet")
        .await;
        runs.push(investigation);
    }

    assert_eq!(runs[0].report.text, runs[1].report.text);
    let order = |i: usize| -> Vec<String> {
        runs[i].evidence.iter().map(|d| d.id().to_string()).collect()
    };
    assert_eq!(order(0), order(1));
    assert_ne!(runs[0].id, runs[1].id);
}

#[tokio::test]
async fn retrieval_failure_yields_error_report() {
    let llm = Arc::new(ScriptedLlm::new().on(REPORT_PROMPT, "unused"));
    let embedder = Arc::new(CountingEmbedder::new(32).fail_on("wallet"));
    let index = Arc::new(StaticIndex::fixed(case_documents()));
    let config = InvestigationConfig {
        strategy: RetrievalStrategy::SingleStep,
        ..Default::default()
    };

    let investigation = investigator(&config, llm.clone(), embedder, index)
        .investigate("Which wallet was used?")
        .await;

    assert!(investigation.verdict.is_relevant);
    assert!(investigation.report.error);
    assert!(investigation
        .report
        .text
        .starts_with("Error retrieving evidence: "));
    assert_eq!(llm.calls_matching(REPORT_PROMPT), 0);
}

#[tokio::test]
async fn report_failure_is_flagged_not_raised() {
    let llm = Arc::new(
        ScriptedLlm::new()
            .fail_on(REPORT_PROMPT, "context length exceeded")
            .otherwise("50"),
    );
    let index = Arc::new(StaticIndex::fixed(case_documents()));
    let config = InvestigationConfig {
        strategy: RetrievalStrategy::SingleStep,
        ..Default::default()
    };

    let investigation = investigator(&config, llm, Arc::new(CountingEmbedder::new(32)), index)
        .investigate("Timeline of the breach")
        .await;

    assert_eq!(investigation.evidence.len(), 3);
    assert!(investigation.report.error);
    assert_eq!(
        investigation.report.text,
        "Error generating report: LLM error: context length exceeded"
    );
}

#[tokio::test]
async fn memory_index_end_to_end() {
    let provider = TrigramProvider::new(64);
    let mut index = MemoryIndex::new(vec![
        IndexedChunk {
            id: "exchange_logs.txt_chunk_0".to_string(),
            text: "hot wallet withdrawal spike after midnight".to_string(),
            metadata: serde_json::json!({"file_name": "exchange_logs.txt", "chunk_index": 0}),
            embedding: Vec::new(),
        },
        IndexedChunk {
            id: "menu.txt_chunk_0".to_string(),
            text: "cafeteria lunch specials".to_string(),
            metadata: serde_json::json!({"file_name": "menu.txt", "chunk_index": 0}),
            embedding: Vec::new(),
        },
    ])
    .unwrap();
    index.embed_missing(&provider).await.unwrap();

    let llm = Arc::new(
        ScriptedLlm::new()
            .on("Document:\nhot wallet", "90")
            .on("Document:\ncafeteria", "0")
            .on(REPORT_PROMPT, "report"),
    );
    let config = InvestigationConfig {
        strategy: RetrievalStrategy::SingleStep,
        top_k_rerank: 1,
        ..Default::default()
    };

    let investigation = investigator(&config, llm, Arc::new(CountingEmbedder::new(64)), Arc::new(index))
        .investigate("hot wallet withdrawal")
        .await;

    assert_eq!(investigation.evidence.len(), 1);
    assert_eq!(investigation.evidence[0].id(), "exchange_logs.txt_chunk_0");
    assert_eq!(
        investigation.evidence[0].document.file_name(),
        Some("exchange_logs.txt")
    );
}
