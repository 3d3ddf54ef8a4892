use lib_adtape::sweep::FunctionExt;
use lib_adtape::Tape;

fn main() {
  // Create a new tape (Wengert list) to record the operations of our function
  let mut tape = Tape::new();
  // Define a scope to play around in, recording `y = x * x`
  let f = tape
    .scope(|guard| {
      let x = guard.var(1.0);
      let y = x * x;
      // After locking a guard, we can only seal the recording into a function
      guard.lock().seal(&[y])
    })
    .expect("recording has an input and an output");

  println!("{f}");
  for x in [1.0, 2.0, 3.0] {
    let y = f.eval(&[x]).expect("eval");
    let dy = f.vjp(&[x], &[1.0]).expect("vjp");
    println!("x: {x}, y: {}, dy/dx: {}", y[0], dy[0]);
  }
}
