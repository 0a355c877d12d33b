use std::sync::Arc;

use carttotal_core_types::{Candidate, NavigationEpoch, OriginalMap, Selector, SimplifiedCandidate, Window};
use prompt_analyzer::{
    AnalysisPlan, Availability, ModelAnalyzer, ModelError, ScriptedLanguageModel,
};

fn fixture(windows: usize) -> (AnalysisPlan, OriginalMap) {
    let mut map = OriginalMap::new();
    let mut plan = Vec::new();
    for index in 0..windows {
        let text = format!("Total ${index}.00");
        map.insert(
            index,
            Candidate::from_locator(Selector::new(format!("p.w{index}"), "p"), text.clone()),
        );
        plan.push(Window::new(vec![SimplifiedCandidate::new(index, text)]));
    }
    (AnalysisPlan::Windows(plan), map)
}

fn reply(index: usize, confidence: f64) -> String {
    format!(r#"{{"index":{index},"text":"t","amount":{index}.5,"confidence":{confidence},"explanation":"e"}}"#)
}

#[tokio::test]
async fn stops_at_first_confident_window() {
    let (plan, map) = fixture(5);
    let model = Arc::new(ScriptedLanguageModel::with_responses([
        reply(0, 0.2),
        reply(1, 0.69),
        reply(2, 0.7),
        reply(3, 0.99),
        reply(4, 0.99),
    ]));
    let analyzer = ModelAnalyzer::new(model.clone());

    let result = analyzer.analyze(&plan, &map).await.unwrap();

    assert_eq!(result.amount, Some(2.5));
    assert_eq!(result.selectors[0].path, "p.w2");
    assert_eq!(model.prompt_count(), 3);
    assert_eq!(model.sessions_created(), 3);
    assert_eq!(model.sessions_destroyed(), 3);
}

#[tokio::test]
async fn exhausts_windows_without_confident_result() {
    let (plan, map) = fixture(3);
    let model = Arc::new(ScriptedLanguageModel::with_responses([
        reply(0, 0.1),
        "I think the total is fifteen dollars".to_string(),
        reply(2, 0.3),
    ]));
    let analyzer = ModelAnalyzer::new(model.clone());

    assert!(analyzer.analyze(&plan, &map).await.is_none());
    assert_eq!(model.prompt_count(), 3);
    assert_eq!(model.sessions_destroyed(), 3);
}

#[tokio::test]
async fn single_window_skips_the_gate() {
    let (_, map) = fixture(1);
    let plan = AnalysisPlan::Single(Window::new(vec![SimplifiedCandidate::new(0, "Total $0.00")]));
    let model = Arc::new(ScriptedLanguageModel::with_responses([reply(0, 0.1)]));

    let result = ModelAnalyzer::new(model.clone()).analyze(&plan, &map).await.unwrap();
    assert_eq!(result.confidence, 0.1);

    let config = &model.session_configs()[0];
    assert_eq!(config.temperature, Some(0.1));
    assert_eq!(config.top_k, Some(1));
    assert_eq!(config.language.as_deref(), Some("en"));
}

#[tokio::test]
async fn unavailable_model_is_never_prompted() {
    let (plan, map) = fixture(2);
    let model = Arc::new(ScriptedLanguageModel::with_responses([reply(0, 0.9)]));
    model.set_availability(Availability::Downloadable);
    let analyzer = ModelAnalyzer::new(model.clone());

    assert!(analyzer.analyze(&plan, &map).await.is_none());
    assert_eq!(model.sessions_created(), 0);

    model.fail_availability(ModelError::unavailable("no runtime"));
    assert!(!analyzer.is_available().await);
}

#[tokio::test]
async fn prompt_failure_still_destroys_the_session() {
    let (plan, map) = fixture(2);
    let model = Arc::new(ScriptedLanguageModel::new());
    model.push_failure(ModelError::prompt("boom"));
    let analyzer = ModelAnalyzer::new(model.clone());

    assert!(analyzer.analyze(&plan, &map).await.is_none());
    assert_eq!(model.sessions_created(), 1);
    assert_eq!(model.sessions_destroyed(), 1);
}

#[tokio::test]
async fn stale_token_stops_before_next_window() {
    let (plan, map) = fixture(3);
    let model = Arc::new(ScriptedLanguageModel::with_responses([
        reply(0, 0.1),
        reply(1, 0.9),
    ]));
    let analyzer = ModelAnalyzer::new(model.clone());
    let epoch = NavigationEpoch::new();
    let token = epoch.token();

    let first = analyzer
        .analyze_window(&plan.windows()[0], &map)
        .await
        .unwrap();
    assert!(first.is_some());
    epoch.advance();

    assert!(analyzer.analyze_with_token(&plan, &map, &token).await.is_none());
    assert_eq!(model.prompt_count(), 1);
}
