//! Hierarchical variable store with lazily evaluated, memoized leaves.

use crate::error::{ActionError, Result};
use crate::path::VariablePath;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

/// Future returned by a deferred producer.
pub type ProducerFuture = BoxFuture<'static, Result<Value>>;

/// Zero-argument computation stored as a leaf and evaluated on first read.
pub type Producer = Arc<dyn Fn() -> ProducerFuture + Send + Sync>;

/// Wraps an async closure into a [`Producer`].
pub fn producer<F, Fut>(f: F) -> Producer
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

tokio::task_local! {
    /// Paths whose producers are being evaluated by the current task.
    static EVALUATING: Vec<VariablePath>;
}

enum Node {
    Branch(BTreeMap<String, Node>),
    Leaf(Value),
    Deferred(Producer),
    Pending(Arc<Notify>),
}

impl Node {
    fn empty_branch() -> Self {
        Node::Branch(BTreeMap::new())
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Node::Branch(
                map.into_iter().map(|(k, v)| (k, Node::Leaf(v))).collect(),
            ),
            other => Node::Leaf(other),
        }
    }
}

enum Lookup {
    Found(Value),
    Missing,
    Deferred(VariablePath, Producer),
    Pending(VariablePath, Arc<Notify>),
}

/// Shared handle to the variable tree of one manifest execution.
///
/// Cloning the handle shares the tree. The lock is never held while a
/// producer runs, so producers may read other variables.
#[derive(Clone, Default)]
pub struct VariableStore {
    root: Arc<Mutex<BTreeMap<String, Node>>>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the value at `path`, evaluating any deferred producer found on
    /// the way or inside the requested subtree.
    pub async fn get(&self, path: &VariablePath) -> Result<Value> {
        loop {
            let lookup = {
                let root = self.root.lock().await;
                let mut walked = Vec::new();
                locate_in(&root, path.segments(), &mut walked)
            };

            match lookup {
                Lookup::Found(value) => return Ok(value),
                Lookup::Missing => {
                    return Err(ActionError::not_found(format!(
                        "Variable `{path}` is not defined."
                    )))
                }
                Lookup::Deferred(at, producer) => {
                    self.evaluate(at, producer).await?;
                }
                Lookup::Pending(at, notify) => {
                    let in_cycle = EVALUATING
                        .try_with(|chain| chain.contains(&at))
                        .unwrap_or(false);

                    if in_cycle {
                        return Err(ActionError::unexpected(format!(
                            "Variable `{at}` depends on itself."
                        )));
                    }

                    let notified = notify.notified();
                    let still_pending = {
                        let root = self.root.lock().await;
                        matches!(
                            node_at(&root, at.segments()),
                            Some(Node::Pending(current)) if Arc::ptr_eq(current, &notify)
                        )
                    };

                    if still_pending {
                        notified.await;
                    }
                }
            }
        }
    }

    pub async fn get_str(&self, path: &str) -> Result<Value> {
        self.get(&VariablePath::parse(path)?).await
    }

    pub async fn contains(&self, path: &VariablePath) -> bool {
        let root = self.root.lock().await;
        node_at(&root, path.segments()).is_some()
            || leaf_value_at(&root, path.segments()).is_some()
    }

    /// Writes a literal, creating intermediate segments and overwriting
    /// whatever was there.
    pub async fn set(&self, path: &VariablePath, value: Value) -> Result<()> {
        tracing::debug!(path = %path, "set variable");
        self.insert(path, Node::from_value(value)).await
    }

    pub async fn set_str(&self, path: &str, value: Value) -> Result<()> {
        self.set(&VariablePath::parse(path)?, value).await
    }

    /// Installs a producer evaluated at most once, on first successful read.
    pub async fn define_deferred(
        &self,
        path: &VariablePath,
        producer: Producer,
    ) -> Result<()> {
        tracing::debug!(path = %path, "define deferred variable");
        self.insert(path, Node::Deferred(producer)).await
    }

    async fn insert(&self, path: &VariablePath, node: Node) -> Result<()> {
        let Some((last, parents)) = path.segments().split_last() else {
            return Err(ActionError::invalid_input(
                "Variable path cannot be empty.",
            ));
        };

        let mut root = self.root.lock().await;
        let mut current = &mut *root;

        for segment in parents {
            let child = current
                .entry(segment.clone())
                .or_insert_with(Node::empty_branch);

            if !matches!(child, Node::Branch(_)) {
                let previous = std::mem::replace(child, Node::empty_branch());
                if let Node::Leaf(Value::Object(map)) = previous {
                    *child = Node::from_value(Value::Object(map));
                }
            }

            current = match child {
                Node::Branch(children) => children,
                _ => unreachable!("intermediate node was just made a branch"),
            };
        }

        current.insert(last.clone(), node);
        Ok(())
    }

    async fn evaluate(&self, at: VariablePath, producer: Producer) -> Result<()> {
        let notify = Arc::new(Notify::new());

        {
            let mut root = self.root.lock().await;
            match node_at_mut(&mut root, at.segments()) {
                Some(node @ Node::Deferred(_)) => {
                    *node = Node::Pending(notify.clone());
                }
                // Someone else resolved or replaced it in the meantime.
                _ => return Ok(()),
            }
        }

        tracing::debug!(path = %at, "evaluating deferred variable");

        let evaluation = Evaluation {
            root: self.root.clone(),
            at: at.clone(),
            notify,
            producer: Some(producer.clone()),
        };

        let mut chain = EVALUATING.try_with(|c| c.clone()).unwrap_or_default();
        chain.push(at);
        let result = EVALUATING.scope(chain, producer()).await;

        evaluation.settle(&result).await;
        result.map(|_| ())
    }
}

/// Ownership of a `Pending` node for the duration of one producer run.
///
/// Dropping it before [`Evaluation::settle`] puts the producer back and
/// wakes the waiters, so a cancelled read never leaves the node pending.
struct Evaluation {
    root: Arc<Mutex<BTreeMap<String, Node>>>,
    at: VariablePath,
    notify: Arc<Notify>,
    producer: Option<Producer>,
}

impl Evaluation {
    async fn settle(mut self, result: &Result<Value>) {
        let mut root = self.root.lock().await;
        if let Some(producer) = self.producer.take() {
            if let Some(node) = pending_node(&mut root, &self.at, &self.notify) {
                *node = match result {
                    Ok(value) => Node::from_value(value.clone()),
                    Err(_) => Node::Deferred(producer),
                };
            }
        }
        drop(root);
        self.notify.notify_waiters();
    }
}

impl Drop for Evaluation {
    fn drop(&mut self) {
        let Some(producer) = self.producer.take() else {
            return;
        };

        tracing::debug!(path = %self.at, "deferred evaluation cancelled");

        if let Ok(mut root) = self.root.try_lock() {
            if let Some(node) = pending_node(&mut root, &self.at, &self.notify) {
                *node = Node::Deferred(producer);
            }
            drop(root);
            self.notify.notify_waiters();
            return;
        }

        // The tree is busy; restore it from a task once the lock is free.
        let root = self.root.clone();
        let at = self.at.clone();
        let notify = self.notify.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let mut root = root.lock().await;
                if let Some(node) = pending_node(&mut root, &at, &notify) {
                    *node = Node::Deferred(producer);
                }
                drop(root);
                notify.notify_waiters();
            });
        }
    }
}

/// The node at `at`, if it is still the `Pending` marker behind `notify`.
fn pending_node<'a>(
    root: &'a mut BTreeMap<String, Node>,
    at: &VariablePath,
    notify: &Arc<Notify>,
) -> Option<&'a mut Node> {
    let node = node_at_mut(root, at.segments())?;
    let ours = matches!(node, Node::Pending(current) if Arc::ptr_eq(current, notify));
    ours.then_some(node)
}

fn node_at<'a>(
    root: &'a BTreeMap<String, Node>,
    segments: &[String],
) -> Option<&'a Node> {
    let (first, rest) = segments.split_first()?;
    let mut node = root.get(first)?;
    for segment in rest {
        node = match node {
            Node::Branch(children) => children.get(segment)?,
            _ => return None,
        };
    }
    Some(node)
}

fn node_at_mut<'a>(
    root: &'a mut BTreeMap<String, Node>,
    segments: &[String],
) -> Option<&'a mut Node> {
    let (first, rest) = segments.split_first()?;
    let mut node = root.get_mut(first)?;
    for segment in rest {
        node = match node {
            Node::Branch(children) => children.get_mut(segment)?,
            _ => return None,
        };
    }
    Some(node)
}

fn leaf_value_at(
    root: &BTreeMap<String, Node>,
    segments: &[String],
) -> Option<Value> {
    match locate_in(root, segments, &mut Vec::new()) {
        Lookup::Found(value) => Some(value),
        _ => None,
    }
}

fn locate_in(
    children: &BTreeMap<String, Node>,
    segments: &[String],
    walked: &mut Vec<String>,
) -> Lookup {
    let Some((first, rest)) = segments.split_first() else {
        return materialize(children, walked);
    };

    match children.get(first) {
        Some(node) => {
            walked.push(first.clone());
            locate(node, rest, walked)
        }
        None => Lookup::Missing,
    }
}

fn locate(node: &Node, segments: &[String], walked: &mut Vec<String>) -> Lookup {
    match node {
        Node::Pending(notify) => Lookup::Pending(
            VariablePath::from_segments(walked.iter().cloned()),
            notify.clone(),
        ),
        Node::Deferred(producer) => Lookup::Deferred(
            VariablePath::from_segments(walked.iter().cloned()),
            producer.clone(),
        ),
        Node::Leaf(value) => match navigate(value, segments) {
            Some(found) => Lookup::Found(found.clone()),
            None => Lookup::Missing,
        },
        Node::Branch(children) => locate_in(children, segments, walked),
    }
}

fn materialize(
    children: &BTreeMap<String, Node>,
    walked: &mut Vec<String>,
) -> Lookup {
    let mut map = Map::new();

    for (key, child) in children {
        walked.push(key.clone());
        match locate(child, &[], walked) {
            Lookup::Found(value) => {
                map.insert(key.clone(), value);
            }
            Lookup::Missing => {}
            unresolved => return unresolved,
        }
        walked.pop();
    }

    Lookup::Found(Value::Object(map))
}

/// Descends into a JSON value by object key or array index.
fn navigate<'a>(value: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorReason;
    use crate::path::escape_segment;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn path(p: &str) -> VariablePath {
        VariablePath::parse(p).unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get_nested() {
        let store = VariableStore::new();
        store.set(&path("project.path.example"), json!("/tmp/app")).await.unwrap();

        assert_eq!(
            store.get(&path("project.path.example")).await.unwrap(),
            json!("/tmp/app")
        );
        assert_eq!(
            store.get(&path("project")).await.unwrap(),
            json!({"path": {"example": "/tmp/app"}})
        );
    }

    #[tokio::test]
    async fn test_missing_path_is_not_found() {
        let store = VariableStore::new();
        let error = store.get(&path("missing")).await.unwrap_err();
        assert_eq!(error.reason(), ErrorReason::NotFound);
    }

    #[tokio::test]
    async fn test_navigates_into_literal_structures() {
        let store = VariableStore::new();
        store
            .set(&path("output.sdk"), json!({"platforms": ["react", "next"]}))
            .await
            .unwrap();

        assert_eq!(
            store.get(&path("output.sdk.platforms.1")).await.unwrap(),
            json!("next")
        );
        assert!(store.get(&path("output.sdk.platforms.7")).await.is_err());
    }

    #[tokio::test]
    async fn test_set_overwrites_and_extends_structures() {
        let store = VariableStore::new();
        store.set(&path("a"), json!({"x": 1})).await.unwrap();
        store.set(&path("a.y"), json!(2)).await.unwrap();
        assert_eq!(store.get(&path("a")).await.unwrap(), json!({"x": 1, "y": 2}));

        store.set(&path("a"), json!("flat")).await.unwrap();
        store.set(&path("a.b"), json!(true)).await.unwrap();
        assert_eq!(store.get(&path("a")).await.unwrap(), json!({"b": true}));
    }

    #[tokio::test]
    async fn test_escaped_keys_do_not_collide() {
        let store = VariableStore::new();
        let joined = path(&format!("input.{}", escape_segment("a/b")));
        let nested = path(&format!(
            "input.{}.{}",
            escape_segment("a"),
            escape_segment("b")
        ));

        store.set(&joined, json!("joined")).await.unwrap();
        store.set(&nested, json!("nested")).await.unwrap();

        assert_eq!(store.get(&joined).await.unwrap(), json!("joined"));
        assert_eq!(store.get(&nested).await.unwrap(), json!("nested"));
    }

    #[tokio::test]
    async fn test_deferred_is_evaluated_once() {
        let store = VariableStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        store
            .define_deferred(
                &path("project.platform"),
                producer(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(json!("react"))
                    }
                }),
            )
            .await
            .unwrap();

        for _ in 0..3 {
            assert_eq!(
                store.get(&path("project.platform")).await.unwrap(),
                json!("react")
            );
        }
        assert_eq!(store.get(&path("project")).await.unwrap(), json!({"platform": "react"}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deferred_can_read_other_variables() {
        let store = VariableStore::new();
        store.set(&path("sdk.name"), json!("@acme/react")).await.unwrap();

        let handle = store.clone();
        store
            .define_deferred(
                &path("platform"),
                producer(move || {
                    let handle = handle.clone();
                    async move {
                        let sdk = handle.get_str("sdk.name").await?;
                        let name = sdk.as_str().unwrap_or_default();
                        Ok(json!(name.trim_start_matches("@acme/")))
                    }
                }),
            )
            .await
            .unwrap();

        assert_eq!(store.get(&path("platform")).await.unwrap(), json!("react"));
    }

    #[tokio::test]
    async fn test_self_reference_fails_fast() {
        let store = VariableStore::new();
        let handle = store.clone();
        store
            .define_deferred(
                &path("loop"),
                producer(move || {
                    let handle = handle.clone();
                    async move { handle.get_str("loop").await }
                }),
            )
            .await
            .unwrap();

        let error = store.get(&path("loop")).await.unwrap_err();
        assert_eq!(error.reason(), ErrorReason::UnexpectedResult);
    }

    #[tokio::test]
    async fn test_failed_producer_is_retried() {
        let store = VariableStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        store
            .define_deferred(
                &path("flaky"),
                producer(move || {
                    let counter = counter.clone();
                    async move {
                        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                            Err(ActionError::unexpected("first call fails"))
                        } else {
                            Ok(json!(7))
                        }
                    }
                }),
            )
            .await
            .unwrap();

        assert!(store.get(&path("flaky")).await.is_err());
        assert_eq!(store.get(&path("flaky")).await.unwrap(), json!(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_evaluation() {
        let store = VariableStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        store
            .define_deferred(
                &path("slow"),
                producer(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        Ok(json!("done"))
                    }
                }),
            )
            .await
            .unwrap();

        let slow = path("slow");
        let (a, b) = tokio::join!(store.get(&slow), store.get(&slow));
        assert_eq!(a.unwrap(), json!("done"));
        assert_eq!(b.unwrap(), json!("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_evaluation_can_be_read_again() {
        let store = VariableStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        store
            .define_deferred(
                &path("slow"),
                producer(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(json!("done"))
                    }
                }),
            )
            .await
            .unwrap();

        let slow = path("slow");
        let cancelled = tokio::time::timeout(Duration::from_millis(5), store.get(&slow)).await;
        assert!(cancelled.is_err());

        let value = tokio::time::timeout(Duration::from_secs(2), store.get(&slow))
            .await
            .expect("read after cancellation should not hang")
            .unwrap();
        assert_eq!(value, json!("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_waiter_recovers_when_evaluation_is_cancelled() {
        let store = VariableStore::new();
        store
            .define_deferred(
                &path("slow"),
                producer(|| async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(json!("done"))
                }),
            )
            .await
            .unwrap();

        let slow = path("slow");
        let first = store.clone();
        let evaluating = tokio::spawn(async move { first.get(&path("slow")).await });
        tokio::time::sleep(Duration::from_millis(5)).await;

        let waiter = store.clone();
        let waiting = tokio::spawn(async move { waiter.get(&slow).await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        evaluating.abort();

        let value = tokio::time::timeout(Duration::from_secs(2), waiting)
            .await
            .expect("waiter should be woken")
            .unwrap()
            .unwrap();
        assert_eq!(value, json!("done"));
    }

    #[tokio::test]
    async fn test_contains() {
        let store = VariableStore::new();
        store.set(&path("a.b"), json!({"c": 1})).await.unwrap();
        assert!(store.contains(&path("a.b")).await);
        assert!(store.contains(&path("a.b.c")).await);
        assert!(!store.contains(&path("a.x")).await);
    }
}
