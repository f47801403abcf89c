use {
    super::{
        RestError,
        WrappedRouter,
    },
    crate::{
        auction::{
            api::process_bid,
            entities,
            service::get_auction::GetAuctionInput,
        },
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        state::StoreNew,
    },
    anyhow::{
        anyhow,
        Result,
    },
    axum::{
        extract::{
            ws::{
                Message,
                WebSocket,
            },
            State,
            WebSocketUpgrade,
        },
        http::HeaderMap,
        response::IntoResponse,
        Router,
    },
    futures::{
        stream::{
            SplitSink,
            SplitStream,
        },
        SinkExt,
        StreamExt,
    },
    pavilion_api_types::{
        auction::{
            Auction,
            BidCreate,
        },
        ws::{
            APIResponse,
            ClientMessage,
            ClientRequest,
            Route,
            ServerResultMessage,
            ServerResultResponse,
            ServerUpdateResponse,
        },
    },
    std::{
        collections::{
            HashMap,
            HashSet,
        },
        future::Future,
        net::IpAddr,
        sync::{
            atomic::{
                AtomicUsize,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
    tokio::sync::{
        broadcast,
        RwLock,
        Semaphore,
    },
    tracing::{
        instrument,
        Instrument,
    },
};

pub struct WsState {
    pub requester_ip_header_name: String,
    subscriber_counter:           AtomicUsize,
    subscriber_per_ip:            RwLock<HashMap<IpAddr, HashSet<SubscriberId>>>,
    pub broadcast_sender:         broadcast::Sender<UpdateEvent>,
    pub broadcast_receiver:       broadcast::Receiver<UpdateEvent>,
}

const MAXIMUM_SUBSCRIBERS_PER_IP: usize = 10;

impl WsState {
    pub fn new(requester_ip_header_name: String, broadcast_channel_size: usize) -> Self {
        let (broadcast_sender, broadcast_receiver) = broadcast::channel(broadcast_channel_size);
        Self {
            requester_ip_header_name,
            subscriber_counter: AtomicUsize::new(0),
            subscriber_per_ip: RwLock::new(HashMap::new()),
            broadcast_sender,
            broadcast_receiver,
        }
    }

    /// If the specified IP address has too many open websocket connections, this function will
    /// return none. Otherwise, it will return the new subscriber id.
    pub async fn get_new_subscriber_id(&self, ip: Option<IpAddr>) -> Option<SubscriberId> {
        let id = self.subscriber_counter.fetch_add(1, Ordering::SeqCst);
        if let Some(ip) = ip {
            let mut write_guard = self.subscriber_per_ip.write().await;
            let ids = write_guard.entry(ip).or_insert_with(HashSet::new);
            if ids.len() >= MAXIMUM_SUBSCRIBERS_PER_IP {
                return None;
            }
            ids.insert(id);
        }
        Some(id)
    }

    pub async fn remove_subscriber(&self, id: SubscriberId, ip: Option<IpAddr>) {
        if let Some(ip) = ip {
            let mut write_guard = self.subscriber_per_ip.write().await;
            if let Some(ids) = write_guard.get_mut(&ip) {
                ids.remove(&id);
                if ids.is_empty() {
                    write_guard.remove(&ip);
                }
            }
        }
    }
}

pub async fn ws_route_handler(
    ws: WebSocketUpgrade,
    State(store): State<Arc<StoreNew>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let ws_state = &store.store.ws;
    let requester_ip = headers
        .get(ws_state.requester_ip_header_name.as_str())
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next()) // Only take the first ip if there are multiple
        .and_then(|value| value.parse().ok());

    if requester_ip.is_none() {
        tracing::warn!("Failed to get requester IP address");
    }

    match ws_state.get_new_subscriber_id(requester_ip).await {
        Some(subscriber_id) => ws
            .on_upgrade(move |socket| websocket_handler(socket, store, subscriber_id, requester_ip)),
        None => RestError::TooManyOpenWebsocketConnections.into_response(),
    }
}

async fn websocket_handler(
    stream: WebSocket,
    state: Arc<StoreNew>,
    subscriber_id: SubscriberId,
    requester_ip: Option<IpAddr>,
) {
    let ws_state = &state.store.ws;
    let (sender, receiver) = stream.split();
    let new_receiver = ws_state.broadcast_receiver.resubscribe();
    let mut subscriber = Subscriber::new(subscriber_id, state.clone(), new_receiver, receiver, sender);
    subscriber.run().await;
    ws_state.remove_subscriber(subscriber_id, requester_ip).await;
}

/// An accepted state change, broadcast by the auction service to every
/// connected subscriber. Subscribers filter on the auction id.
#[derive(Clone, Debug)]
pub enum UpdateEvent {
    AuctionUpdated(entities::Auction),
    AuctionStarted(entities::Auction),
    AuctionEnded(entities::Auction),
    BidPlaced {
        bid:     entities::Bid,
        auction: entities::Auction,
    },
    TimerUpdated(entities::Auction),
}

impl UpdateEvent {
    pub fn auction_id(&self) -> entities::AuctionId {
        match self {
            UpdateEvent::AuctionUpdated(auction)
            | UpdateEvent::AuctionStarted(auction)
            | UpdateEvent::AuctionEnded(auction)
            | UpdateEvent::TimerUpdated(auction) => auction.id,
            UpdateEvent::BidPlaced { auction, .. } => auction.id,
        }
    }
}

pub type SubscriberId = usize;

/// Subscriber is an actor that handles a single websocket connection.
/// It listens to the store for updates and sends them to the client.
pub struct Subscriber {
    id:                  SubscriberId,
    closed:              bool,
    store:               Arc<StoreNew>,
    notify_receiver:     broadcast::Receiver<UpdateEvent>,
    receiver:            SplitStream<WebSocket>,
    sender:              SplitSink<WebSocket, Message>,
    auction_ids:         HashSet<entities::AuctionId>,
    ping_interval:       tokio::time::Interval,
    exit_check_interval: tokio::time::Interval,
    responded_to_ping:   bool,
    active_requests:     Arc<Semaphore>,
    response_sender:     broadcast::Sender<ServerResultResponse>,
    response_receiver:   broadcast::Receiver<ServerResultResponse>,
}

const PING_INTERVAL_DURATION: Duration = Duration::from_secs(30);

fn ok_response(id: String) -> ServerResultResponse {
    ServerResultResponse {
        id:     Some(id),
        result: ServerResultMessage::Success(None),
    }
}

const MAX_ACTIVE_REQUESTS: usize = 50;

impl Subscriber {
    pub fn new(
        id: SubscriberId,
        store: Arc<StoreNew>,
        notify_receiver: broadcast::Receiver<UpdateEvent>,
        receiver: SplitStream<WebSocket>,
        sender: SplitSink<WebSocket, Message>,
    ) -> Self {
        let (response_sender, response_receiver) = broadcast::channel(100);
        Self {
            id,
            closed: false,
            store,
            notify_receiver,
            receiver,
            sender,
            auction_ids: HashSet::new(),
            ping_interval: tokio::time::interval(PING_INTERVAL_DURATION),
            exit_check_interval: tokio::time::interval(EXIT_CHECK_INTERVAL),
            responded_to_ping: true, // We start with true so we don't close the connection immediately
            active_requests: Arc::new(Semaphore::new(MAX_ACTIVE_REQUESTS)),
            response_receiver,
            response_sender,
        }
    }

    pub async fn run(&mut self) {
        while !self.closed {
            if let Err(e) = self.handle_next().await {
                tracing::debug!(subscriber = self.id, error = ?e, "Error Handling Subscriber Message.");
                break;
            }
        }
    }

    async fn handle_next(&mut self) -> Result<()> {
        tokio::select! {
            maybe_update_event = self.notify_receiver.recv() => {
                match maybe_update_event {
                    Ok(event) => self.handle_update(event).await,
                    Err(e) => Err(anyhow!("Error receiving update event: {:?}", e)),
                }
            },
            maybe_message_or_err = self.receiver.next() => {
                self.handle_client_message(
                    maybe_message_or_err.ok_or(anyhow!("Client channel is closed"))??
                ).await
            },
            response_received = self.response_receiver.recv() => {
                match response_received {
                    Ok(response) => {
                        self.sender.send(serde_json::to_string(&response)?.into()).await?;
                    }
                    Err(e) => {
                        tracing::warn!(
                            subscriber = self.id,
                            error = ?e,
                            "Error Handling Subscriber Response Message."
                        );
                    }
                }
                Ok(())
            },
            _  = self.ping_interval.tick() => {
                if !self.responded_to_ping {
                    return Err(anyhow!("Subscriber did not respond to ping. Closing connection."));
                }
                self.responded_to_ping = false;
                self.sender.send(Message::Ping(vec![])).await?;
                Ok(())
            },
            _ = self.exit_check_interval.tick() => {
                if SHOULD_EXIT.load(Ordering::Acquire) {
                    self.sender.close().await?;
                    self.closed = true;
                    return Err(anyhow!("Application is shutting down. Closing connection."));
                }
                Ok(())
            }
        }
    }

    #[instrument(
        target = "metrics",
        fields(category = "ws_update", result = "success", name),
        skip_all
    )]
    async fn handle_update(&mut self, event: UpdateEvent) -> Result<()> {
        if !self.auction_ids.contains(&event.auction_id()) {
            // Irrelevant update
            return Ok(());
        }
        let update = match event {
            UpdateEvent::AuctionUpdated(auction) => {
                tracing::Span::current().record("name", "auction_updated");
                ServerUpdateResponse::AuctionUpdated {
                    auction: Auction::from(auction),
                }
            }
            UpdateEvent::AuctionStarted(auction) => {
                tracing::Span::current().record("name", "auction_started");
                ServerUpdateResponse::AuctionStarted {
                    auction: Auction::from(auction),
                }
            }
            UpdateEvent::AuctionEnded(auction) => {
                tracing::Span::current().record("name", "auction_ended");
                ServerUpdateResponse::AuctionEnded {
                    auction: Auction::from(auction),
                }
            }
            UpdateEvent::BidPlaced { bid, auction } => {
                tracing::Span::current().record("name", "bid_placed");
                ServerUpdateResponse::BidPlaced {
                    bid:     bid.into(),
                    auction: Auction::from(auction),
                }
            }
            UpdateEvent::TimerUpdated(auction) => {
                tracing::Span::current().record("name", "timer_updated");
                ServerUpdateResponse::TimerUpdated {
                    auction: Auction::from(auction),
                }
            }
        };
        let message = serde_json::to_string(&update)?;
        if let Err(e) = self.sender.send(message.into()).await {
            tracing::Span::current().record("result", "error");
            return Err(e.into());
        }
        Ok(())
    }

    async fn handle_subscribe(
        &mut self,
        message_id: String,
        auction_ids: Vec<entities::AuctionId>,
    ) {
        let mut not_found_auction_ids = Vec::new();
        for auction_id in &auction_ids {
            if self
                .store
                .auction_service
                .get_auction(GetAuctionInput {
                    auction_id: *auction_id,
                })
                .await
                .is_err()
            {
                not_found_auction_ids.push(*auction_id);
            }
        }
        // If there is a single auction id that is not found, we don't subscribe to any of the
        // asked correct auction ids and return an error to be more explicit and clear.
        let resp = if !not_found_auction_ids.is_empty() {
            ServerResultResponse {
                id:     Some(message_id),
                result: ServerResultMessage::Err(format!(
                    "Auction(s) with id(s) {:?} not found",
                    not_found_auction_ids
                )),
            }
        } else {
            self.auction_ids.extend(auction_ids);
            ok_response(message_id)
        };
        Self::send_response(&self.response_sender, resp);
    }

    async fn handle_unsubscribe(
        &mut self,
        message_id: String,
        auction_ids: Vec<entities::AuctionId>,
    ) {
        self.auction_ids
            .retain(|auction_id| !auction_ids.contains(auction_id));
        Self::send_response(&self.response_sender, ok_response(message_id));
    }

    fn send_response(
        response_sender: &broadcast::Sender<ServerResultResponse>,
        response: ServerResultResponse,
    ) {
        if matches!(response.result, ServerResultMessage::Err(_)) {
            tracing::Span::current().record("result", "error");
        }
        if let Err(e) = response_sender.send(response) {
            tracing::warn!(error = ?e, "Error sending response to subscriber");
        }
    }

    async fn spawn_deferred(
        &mut self,
        fut: impl Future<Output = ServerResultResponse> + Send + 'static,
    ) {
        let permit = self
            .active_requests
            .clone()
            .acquire_owned()
            .await
            .expect("Semaphore should not be closed");
        let response_sender = self.response_sender.clone();
        self.store.task_tracker.spawn(
            async move {
                let resp = fut.await;
                Self::send_response(&response_sender, resp);
                drop(permit);
            }
            .in_current_span(),
        );
    }

    async fn handle_post_bid(
        &mut self,
        message_id: String,
        auction_id: entities::AuctionId,
        bid: BidCreate,
    ) {
        let store = self.store.clone();
        self.spawn_deferred(async move {
            match process_bid(store, auction_id, bid).await {
                Ok(bid_result) => ServerResultResponse {
                    id:     Some(message_id),
                    result: ServerResultMessage::Success(Some(APIResponse::BidResult(
                        bid_result.0,
                    ))),
                },
                Err(e) => ServerResultResponse {
                    id:     Some(message_id),
                    result: ServerResultMessage::Err(e.to_status_and_message().1),
                },
            }
        })
        .await;
    }

    #[instrument(
        target = "metrics",
        fields(category = "ws_client_message", result = "success", name),
        skip_all
    )]
    async fn handle_client_message(&mut self, message: Message) -> Result<()> {
        let maybe_client_message = match message {
            Message::Close(_) => {
                // Closing the connection. We don't remove it from the subscribers
                // list, instead when the Subscriber struct is dropped the channel
                // to subscribers list will be closed and it will eventually get
                // removed.
                // Send the close message to gracefully shut down the connection
                // Otherwise the client might get an abnormal Websocket closure
                // error.
                tracing::Span::current().record("name", "close");
                if let Err(e) = self.sender.close().await {
                    tracing::Span::current().record("result", "error");
                    return Err(e.into());
                }
                self.closed = true;
                return Ok(());
            }
            Message::Text(text) => serde_json::from_str::<ClientRequest>(&text),
            Message::Binary(data) => serde_json::from_slice::<ClientRequest>(&data),
            Message::Ping(_) => {
                // Axum will send Pong automatically
                tracing::Span::current().record("name", "ping");
                return Ok(());
            }
            Message::Pong(_) => {
                tracing::Span::current().record("name", "pong");
                self.responded_to_ping = true;
                return Ok(());
            }
        };

        match maybe_client_message {
            Err(e) => {
                let resp = ServerResultResponse {
                    id:     None,
                    result: ServerResultMessage::Err(e.to_string()),
                };
                Self::send_response(&self.response_sender, resp);
            }
            Ok(ClientRequest { msg, id }) => match msg {
                ClientMessage::Subscribe { auction_ids } => {
                    tracing::Span::current().record("name", "subscribe");
                    self.handle_subscribe(id, auction_ids).await
                }
                ClientMessage::Unsubscribe { auction_ids } => {
                    tracing::Span::current().record("name", "unsubscribe");
                    self.handle_unsubscribe(id, auction_ids).await
                }
                ClientMessage::PostBid { auction_id, bid } => {
                    tracing::Span::current().record("name", "post_bid");
                    self.handle_post_bid(id, auction_id, bid).await
                }
            },
        };

        Ok(())
    }
}

pub fn get_routes(store: Arc<StoreNew>) -> Router<Arc<StoreNew>> {
    WrappedRouter::new(store)
        .route(Route::Ws, ws_route_handler)
        .router
}
