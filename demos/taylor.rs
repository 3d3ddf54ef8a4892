use lib_adtape::sweep::Evaluator;
use lib_adtape::Tape;

/// Taylor coefficients of `exp(sin(t))` at `t = 0`, and the derivatives they
/// give by reverse sweeps of every order
fn main() {
  let q = 6;
  let f = Tape::new()
    .scope(|guard| {
      let t = guard.var(0.0);
      guard.lock().seal(&[t.sin().exp()])
    })
    .expect("recording has an input and an output");

  let mut xq = vec![0.0; q + 1];
  xq[1] = 1.0;
  let mut eval = Evaluator::new(&f);
  let y = eval.forward(q, &xq).expect("forward");
  let mut factorial = 1.0;
  for (k, c) in y.iter().enumerate() {
    if k > 0 {
      factorial *= k as f64;
    }
    println!("y^({k}) = {c:+.6}, d^{k}y/dt^{k} = {:+.6}", c * factorial);
  }

  // partials of the order q coefficient with respect to every input order
  let dw = eval.reverse(q + 1, &[1.0]).expect("reverse");
  for (k, d) in dw.iter().enumerate() {
    println!("d y^({q}) / d x^({k}) = {d:+.6}");
  }
}
