use serde::Deserialize;
use std::{marker::PhantomData, sync::Arc};

use super::{ExchangeTransformer, MarketUpdate, Transformer};
use crate::{
    error::SocketError,
    exchange::StreamConnector,
    model::market_event::{EventQuote, MarketEvent},
    shared::registry::SymbolRegistry,
};

/*----- */
// Stateless transformer
/*----- */
/// Resolves every message by the native id it carries. Used by exchanges whose
/// data messages name the instrument directly.
#[derive(Debug)]
pub struct StatelessTransformer<Exchange, Input> {
    registry: Arc<SymbolRegistry>,
    phantom: PhantomData<(Exchange, Input)>,
}

impl<Exchange, DeStruct> Transformer for StatelessTransformer<Exchange, DeStruct>
where
    Exchange: StreamConnector,
    DeStruct: Send + for<'de> Deserialize<'de> + MarketUpdate,
{
    type Error = SocketError;
    type Input = DeStruct;
    type Output = MarketEvent<EventQuote>;

    fn transform(&mut self, update: Self::Input) -> Result<Option<Self::Output>, Self::Error> {
        let native = match update.market_update()? {
            Some(native) if !native.quote.is_empty() => native,
            _ => return Ok(None),
        };

        let symbol = self
            .registry
            .resolve(Exchange::ID, &native.market)
            .ok_or_else(|| SocketError::UnknownInstrument {
                exchange: Exchange::ID,
                native_id: native.market.clone(),
            })?;

        Ok(Some(MarketEvent::new_quote(
            Exchange::ID,
            symbol.clone(),
            native.exchange_time,
            native.quote,
        )))
    }
}

impl<Exchange, DeStruct> ExchangeTransformer<Exchange> for StatelessTransformer<Exchange, DeStruct>
where
    Exchange: StreamConnector + Send,
    DeStruct: Send + for<'de> Deserialize<'de> + MarketUpdate,
{
    fn init(registry: Arc<SymbolRegistry>) -> Self {
        Self {
            registry,
            phantom: PhantomData,
        }
    }
}
