use async_trait::async_trait;

pub trait Tool {
    type Context;
    fn apply(&self, context: Self::Context) -> String;
}

#[async_trait]
pub trait AsyncTool: Send + Sync {
    type Context: Send + 'static;
    async fn apply(&self, context: Self::Context) -> anyhow::Result<String>;
}

/// Lifts a synchronous tool into the async toolset.
pub struct AsyncToolWrapper<C> {
    pub tool: Box<dyn Tool<Context = C> + Send + Sync>,
}

#[async_trait]
impl<C> AsyncTool for AsyncToolWrapper<C>
where
    C: Send + 'static,
{
    type Context = C;

    async fn apply(&self, context: C) -> anyhow::Result<String> {
        Ok(self.tool.apply(context))
    }
}
