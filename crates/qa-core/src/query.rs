use std::sync::Arc;

use tracing::debug;

use crate::answer::Answer;
use crate::assembler::{AssemblerConfig, ResultAssembler};
use crate::client::{ComputationClient, ImageHostingClient};
use crate::convert::ConversionResolver;
use crate::error::Error;
use crate::fragment::Fragment;

/// External collaborators a computation query needs.
#[derive(Clone)]
pub struct Services {
    pub computation: Arc<dyn ComputationClient>,
    pub images: Arc<dyn ImageHostingClient>,
    pub assembler: AssemblerConfig,
}

impl Services {
    pub fn new(computation: Arc<dyn ComputationClient>, images: Arc<dyn ImageHostingClient>) -> Self {
        Self {
            computation,
            images,
            assembler: AssemblerConfig::default(),
        }
    }

    pub fn with_assembler_config(mut self, config: AssemblerConfig) -> Self {
        self.assembler = config;
        self
    }
}

/// A query routed from the chat front end.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Conversion(ConversionQuery),
    Computation(ComputationQuery),
}

impl Query {
    pub fn conversion(query: impl Into<String>, resolver: &dyn ConversionResolver) -> Result<Self, Error> {
        ConversionQuery::new(query, resolver).map(Query::Conversion)
    }

    pub fn computation(query: impl Into<String>, full: bool) -> Self {
        Query::Computation(ComputationQuery::new(query, full))
    }

    pub fn text(&self) -> &str {
        match self {
            Query::Conversion(q) => q.query(),
            Query::Computation(q) => q.query(),
        }
    }

    pub async fn solve(&self, services: &Services) -> Answer {
        match self {
            Query::Conversion(q) => q.solve(),
            Query::Computation(q) => q.solve(services).await,
        }
    }

    /// Solve and hand the `(message, fragments, error)` triple to `callback`,
    /// which runs exactly once.
    pub async fn solve_with<F>(&self, services: &Services, callback: F)
    where
        F: FnOnce(Option<String>, Option<Vec<Fragment>>, bool),
    {
        let (message, fragments, error) = self.solve(services).await.into_parts();
        callback(message, fragments, error);
    }
}

/// A query answered locally by unit conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionQuery {
    query: String,
    solution: Vec<String>,
}

impl ConversionQuery {
    /// Fails with [`Error::NothingToConvert`] when the resolver finds no
    /// conversion for `query`.
    pub fn new(query: impl Into<String>, resolver: &dyn ConversionResolver) -> Result<Self, Error> {
        let query = query.into();
        let solution = resolver.resolve(&query);
        if solution.is_empty() {
            return Err(Error::NothingToConvert(query));
        }
        Ok(Self { query, solution })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn solution(&self) -> &[String] {
        &self.solution
    }

    pub fn solve(&self) -> Answer {
        Answer::Message(format!("{} = {}", self.query, self.solution.join(" = ")))
    }
}

/// A query delegated to the computation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputationQuery {
    query: String,
    full: bool,
}

impl ComputationQuery {
    /// With `full` unset only the primary pod (or the fallback pod) is shown.
    pub fn new(query: impl Into<String>, full: bool) -> Self {
        Self {
            query: query.into(),
            full,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub async fn solve(&self, services: &Services) -> Answer {
        debug!(
            query = %self.query,
            full = self.full,
            client = services.computation.name(),
            "Querying computation service"
        );
        let outcome = services.computation.query(&self.query).await;

        ResultAssembler::new(services.images.as_ref(), &services.assembler)
            .assemble(outcome, &self.query, self.full)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::UnitConverter;
    use crate::result::{Pod, ResultTree, Subpod};
    use crate::testing::{MockComputationClient, MockImageHost};

    struct FixedResolver(Vec<&'static str>);

    impl ConversionResolver for FixedResolver {
        fn resolve(&self, _input: &str) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    fn services() -> (Arc<MockComputationClient>, Arc<MockImageHost>, Services) {
        let computation = Arc::new(MockComputationClient::new());
        let images = Arc::new(MockImageHost::new());
        let services = Services::new(computation.clone(), images.clone());
        (computation, images, services)
    }

    #[tokio::test]
    async fn test_conversion_message() {
        let (computation, _, services) = services();
        let query = Query::conversion("1 ft", &FixedResolver(vec!["12 in", "30.48 cm"])).unwrap();

        let answer = query.solve(&services).await;
        assert_eq!(answer.into_parts(), (Some("1 ft = 12 in = 30.48 cm".to_string()), None, false));
        assert_eq!(computation.query_count(), 0);
    }

    #[test]
    fn test_conversion_requires_result() {
        let err = Query::conversion("population of france", &UnitConverter::new()).unwrap_err();
        assert!(matches!(err, Error::NothingToConvert(q) if q == "population of france"));
    }

    #[test]
    fn test_conversion_with_unit_converter() {
        let query = ConversionQuery::new("1 kg", &UnitConverter::new()).unwrap();
        assert_eq!(query.query(), "1 kg");
        assert!(query.solution().contains(&"1000 g".to_string()));
        assert!(query.solve().message().unwrap().starts_with("1 kg = 1000 g = "));
    }

    #[tokio::test]
    async fn test_computation_zero_pods() {
        let (computation, _, services) = services();
        computation.queue_tree(ResultTree::default());

        let answer = Query::computation("asdfgh", false).solve(&services).await;
        assert_eq!(answer.into_parts(), (None, None, true));
        assert_eq!(
            *computation.captured_queries.lock().unwrap(),
            vec!["asdfgh".to_string()]
        );
    }

    #[tokio::test]
    async fn test_computation_error_is_collapsed() {
        let (computation, _, services) = services();
        computation.queue_error(Error::api(503, "unavailable"));

        let answer = Query::computation("2+2", true).solve(&services).await;
        assert!(answer.is_error());
    }

    #[tokio::test]
    async fn test_computation_fallback_pod() {
        let (computation, images, services) = services();
        computation.queue_tree(ResultTree::new(vec![
            Pod::new("Input").with_subpod(Subpod::new("https://wolframalpha.com/in.gif", "in")),
            Pod::new("Result").with_subpod(Subpod::new("https://wolframalpha.com/out.gif", "out")),
            Pod::new("Plot").with_subpod(Subpod::new("https://wolframalpha.com/plot.gif", "plot")),
        ]));

        let answer = Query::computation("sin(x)", false).solve(&services).await;
        let fragments = answer.fragments().unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].title, "Result");
        assert_eq!(fragments[0].fallback, "out");
        assert_eq!(images.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_solve_with_calls_back_once() {
        let (computation, _, services) = services();
        computation.queue_tree(ResultTree::new(vec![Pod::new("Result")
            .primary()
            .with_subpod(Subpod::text_only("4"))]));

        let mut calls = Vec::new();
        Query::computation("2+2", false)
            .solve_with(&services, |message, fragments, error| {
                calls.push((message, fragments.map(|f| f.len()), error));
            })
            .await;

        assert_eq!(calls, vec![(None, Some(1), false)]);
    }

    #[test]
    fn test_query_text() {
        let query = Query::computation("weather in Paris", true);
        assert_eq!(query.text(), "weather in Paris");
        assert!(matches!(query, Query::Computation(ref q) if q.is_full()));
    }
}
