use aquabulk::model::Role;
use aquabulk::store::MemoryStore;
use aquabulk::{Flow, FlowContext, FlowError, Listing, Market, StepControl, User};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::runtime::Runtime;

struct Seeded {
  market: Market,
  buyers: Vec<User>,
  listings: Vec<Listing>,
}

async fn seed(num_buyers: usize, num_listings: usize) -> Seeded {
  let market = Market::in_memory(MemoryStore::new());
  let seller = market
    .accounts
    .register("bench-seller", String::new(), Role::Seller)
    .await
    .unwrap();
  let mut buyers = Vec::with_capacity(num_buyers);
  for i in 0..num_buyers {
    buyers.push(
      market
        .accounts
        .register(&format!("bench-buyer-{}", i), String::new(), Role::Buyer)
        .await
        .unwrap(),
    );
  }
  let mut listings = Vec::with_capacity(num_listings);
  for i in 0..num_listings {
    listings.push(
      market
        .inventory
        .restock(seller.id, &format!("Model-{}", i), Decimal::new(199, 2), i32::MAX / 2)
        .await
        .unwrap(),
    );
  }
  Seeded {
    market,
    buyers,
    listings,
  }
}

fn bench_single_purchase(c: &mut Criterion) {
  let mut group = c.benchmark_group("Purchase");
  let rt = Runtime::new().unwrap();
  let seeded = rt.block_on(seed(1, 1));
  let (buyer, listing) = (seeded.buyers[0].id, seeded.listings[0].id);

  group.throughput(Throughput::Elements(1));
  group.bench_function("uncontended", |b| {
    b.to_async(&rt).iter(|| {
      let engine = seeded.market.engine.clone();
      async move { engine.purchase(buyer, listing, 1).await.unwrap() }
    });
  });
  group.finish();
}

fn bench_contended_purchases(c: &mut Criterion) {
  let mut group = c.benchmark_group("ContendedPurchase");
  let rt = Runtime::new().unwrap();

  for concurrency in [2usize, 8, 32].iter() {
    let seeded = rt.block_on(seed(*concurrency, 1));
    let listing = seeded.listings[0].id;
    let buyers: Arc<Vec<_>> = Arc::new(seeded.buyers.iter().map(|u| u.id).collect());

    group.throughput(Throughput::Elements(*concurrency as u64));
    group.bench_with_input(BenchmarkId::from_parameter(concurrency), concurrency, |b, _| {
      b.to_async(&rt).iter(|| {
        let engine = seeded.market.engine.clone();
        let buyers = buyers.clone();
        async move {
          let tasks = buyers.iter().map(|buyer| {
            let engine = engine.clone();
            let buyer = *buyer;
            tokio::spawn(async move { engine.purchase(buyer, listing, 1).await })
          });
          for joined in join_all(tasks).await {
            joined.unwrap().unwrap();
          }
        }
      });
    });
  }
  group.finish();
}

fn bench_checkout(c: &mut Criterion) {
  let mut group = c.benchmark_group("FillCartAndCheckout");
  let rt = Runtime::new().unwrap();

  for lines in [1usize, 5, 20].iter() {
    let seeded = rt.block_on(seed(1, *lines));
    let buyer = seeded.buyers[0].id;
    let product_ids: Vec<_> = seeded.listings.iter().map(|l| l.id).collect();

    group.throughput(Throughput::Elements(*lines as u64));
    group.bench_with_input(BenchmarkId::from_parameter(lines), lines, |b, _| {
      b.to_async(&rt).iter(|| {
        let market = seeded.market.clone();
        let product_ids = product_ids.clone();
        async move {
          for id in &product_ids {
            market.cart.add(buyer, *id, 1).await.unwrap();
          }
          market.engine.checkout(buyer).await.unwrap()
        }
      });
    });
  }
  group.finish();
}

fn bench_flow_overhead(c: &mut Criterion) {
  let mut group = c.benchmark_group("FlowOverhead");
  let rt = Runtime::new().unwrap();

  let mut flow = Flow::<u64, FlowError>::new(&[("authorize", false, None), ("execute", false, None)]);
  for step in ["authorize", "execute"] {
    flow.on_root(step, |ctx: FlowContext<u64>| async move {
      *ctx.write() += 1;
      Ok::<_, FlowError>(StepControl::Continue)
    });
  }
  let flow = Arc::new(flow);

  group.throughput(Throughput::Elements(1));
  group.bench_function("two_step_flow", |b| {
    b.to_async(&rt).iter_batched(
      || FlowContext::new(0u64),
      |ctx| {
        let flow = flow.clone();
        async move { flow.run(ctx).await.unwrap() }
      },
      criterion::BatchSize::SmallInput,
    );
  });
  group.finish();
}

criterion_group!(
  benches,
  bench_single_purchase,
  bench_contended_purchases,
  bench_checkout,
  bench_flow_overhead
);
criterion_main!(benches);
