// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `gl-program`.
//
// `gl-program` is free software: you can redistribute it and/or modify it under the terms of
// either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
// version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `gl-program` is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Lesser General Public License or the Mozilla Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `gl-program`. If not, see <https://www.gnu.org/licenses/>.

// Easy module for setting up a window and a GL context for the examples.

mod util {
    use gl_program_glow::GlowContext;

    use glutin::config::{Config, ConfigTemplateBuilder};
    use glutin::context::{
        ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentContext,
        PossiblyCurrentContext, Version,
    };
    use glutin::display::{Display, GetGlDisplay};
    use glutin::prelude::*;

    use glutin::surface::{Surface, SwapInterval, WindowSurface};
    use glutin_winit::{DisplayBuilder, GlWindow};

    use raw_window_handle::HasRawWindowHandle;

    use std::error::Error;
    use std::mem;
    use std::num::NonZeroU32;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use winit::dpi::LogicalSize;
    use winit::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};
    use winit::event_loop::{EventLoop, EventLoopWindowTarget};
    use winit::window::{Window, WindowBuilder};

    /// The context type the examples render with.
    pub(crate) type Gl = GlowContext<glow::Context>;

    pub(crate) fn init() {
        tracing_subscriber::fmt::init();
    }

    struct GlutinSetup {
        display: Display,
        config: Config,
        context: ContextType,
        window: Option<Window>,
    }

    enum ContextType {
        NotCurrent(NotCurrentContext),
        Current {
            context: PossiblyCurrentContext,
            window: Window,
            surface: Surface<WindowSurface>,
        },
        Hole,
    }

    impl Default for ContextType {
        fn default() -> Self {
            Self::Hole
        }
    }

    fn make_window_builder() -> WindowBuilder {
        WindowBuilder::new()
            .with_title("LearnOpenGL")
            .with_inner_size(LogicalSize::new(800.0, 600.0))
    }

    impl GlutinSetup {
        fn new<T>(event_loop: &EventLoopWindowTarget<T>) -> Result<Self, Box<dyn Error>> {
            // Start building a window.
            let window = if cfg!(windows) {
                Some(make_window_builder())
            } else {
                None
            };

            // Use the window builder to start building a display.
            let display = DisplayBuilder::new().with_window_builder(window);

            // Take the config with the most samples.
            let (window, gl_config) =
                display.build(event_loop, ConfigTemplateBuilder::new(), |configs| {
                    configs
                        .reduce(|accum, config| {
                            if config.num_samples() > accum.num_samples() {
                                config
                            } else {
                                accum
                            }
                        })
                        .unwrap()
                })?;

            tracing::debug!("config: {:?}", &gl_config);
            tracing::debug!("api: {:?}", gl_config.api());

            // Prefer a 4.1 core context, fall back to whatever the display offers.
            let window_handle = window.as_ref().map(|w| w.raw_window_handle());
            let contexts = [
                ContextAttributesBuilder::new()
                    .with_profile(GlProfile::Core)
                    .with_context_api(ContextApi::OpenGl(Some(Version::new(4, 1))))
                    .build(window_handle),
                ContextAttributesBuilder::new().build(window_handle),
                ContextAttributesBuilder::new()
                    .with_context_api(ContextApi::Gles(Some(Version::new(3, 0))))
                    .build(window_handle),
            ];

            let display = gl_config.display();
            let gl_handler = (|| {
                // Try to build a context for each config.
                for context in &contexts {
                    if let Ok(gl_context) = unsafe { display.create_context(&gl_config, context) } {
                        return Ok(gl_context);
                    }
                }

                // If we couldn't build a context, return an error.
                Err(Box::<dyn std::error::Error>::from(
                    "Could not create a context",
                ))
            })()?;

            Ok(Self {
                display,
                config: gl_config,
                context: ContextType::NotCurrent(gl_handler),
                window,
            })
        }

        fn make_current<T>(
            &mut self,
            window_target: &EventLoopWindowTarget<T>,
        ) -> Result<glow::Context, Box<dyn Error>> {
            let window = match self.window.take() {
                Some(window) => window,
                None => glutin_winit::finalize_window(
                    window_target,
                    make_window_builder(),
                    &self.config,
                )?,
            };

            let attrs = window.build_surface_attributes(<_>::default());
            let gl_surface = unsafe {
                self.display
                    .create_window_surface(&self.config, &attrs)?
            };

            // Make it current.
            let gl_context = match mem::take(&mut self.context) {
                ContextType::NotCurrent(context) => context.make_current(&gl_surface)?,
                _ => return Err("context is already current".into()),
            };

            // Try setting vsync.
            if let Err(res) = gl_surface
                .set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::new(1).unwrap()))
            {
                tracing::warn!("Error setting vsync: {res:?}");
            }

            self.context = ContextType::Current {
                context: gl_context,
                window,
                surface: gl_surface,
            };

            let glow_context = unsafe {
                glow::Context::from_loader_function_cstr(|s| {
                    self.display.get_proc_address(s) as *const _
                })
            };

            #[cfg(not(target_vendor = "apple"))]
            unsafe {
                use glow::HasContext;

                glow_context.enable(glow::DEBUG_OUTPUT);
                glow_context.debug_message_callback(debug_message_callback);
            }

            Ok(glow_context)
        }
    }

    /// Open a window and drive a render loop on it.
    ///
    /// `setup` runs once the context is current, `frame` runs once per frame with the time
    /// since `setup` returned, and `teardown` runs before the event loop exits.
    pub(crate) fn with_context<S: 'static>(
        setup: impl FnOnce(&Rc<Gl>) -> Result<S, Box<dyn Error>> + 'static,
        mut frame: impl FnMut(&Gl, &mut S, Duration) + 'static,
        teardown: impl FnOnce(&Gl, S) + 'static,
    ) -> Result<(), Box<dyn Error>> {
        let event_loop = EventLoop::new();
        let mut glutin = GlutinSetup::new(&event_loop)?;

        let mut setup = Some(setup);
        let mut teardown = Some(teardown);
        let mut running: Option<(Rc<Gl>, S, Instant)> = None;

        event_loop.run(move |event, window_target, control_flow| {
            control_flow.set_poll();

            match event {
                Event::Resumed => {
                    let Some(setup) = setup.take() else {
                        return;
                    };

                    let started = glutin.make_current(window_target).and_then(|context| {
                        // SAFETY: make_current just made this context current, and it stays
                        // current on this thread until the loop exits.
                        let gl = Rc::new(unsafe { GlowContext::new(context)? });
                        let state = setup(&gl)?;
                        Ok((gl, state, Instant::now()))
                    });

                    match started {
                        Ok(started) => running = Some(started),
                        Err(err) => {
                            tracing::error!("failed to start: {err}");
                            control_flow.set_exit();
                        }
                    }
                }
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::Resized(size) => {
                        if size.width != 0 && size.height != 0 {
                            if let (
                                ContextType::Current {
                                    context, surface, ..
                                },
                                Some((gl, ..)),
                            ) = (&glutin.context, &running)
                            {
                                surface.resize(
                                    context,
                                    NonZeroU32::new(size.width).unwrap(),
                                    NonZeroU32::new(size.height).unwrap(),
                                );
                                gl.resize(size.width, size.height);
                            }
                        }
                    }
                    WindowEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                virtual_keycode: Some(VirtualKeyCode::Escape),
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    }
                    | WindowEvent::CloseRequested => {
                        control_flow.set_exit();
                    }
                    _ => (),
                },
                Event::RedrawEventsCleared => {
                    if let (
                        ContextType::Current {
                            context,
                            window,
                            surface,
                        },
                        Some((gl, state, started)),
                    ) = (&glutin.context, &mut running)
                    {
                        frame(gl, state, started.elapsed());

                        window.request_redraw();
                        if let Err(err) = surface.swap_buffers(context) {
                            tracing::error!("failed to swap buffers: {err}");
                        }
                    }
                }
                Event::LoopDestroyed => {
                    if let (Some((gl, state, _)), Some(teardown)) =
                        (running.take(), teardown.take())
                    {
                        teardown(&gl, state);
                    }
                }
                _ => (),
            }
        })
    }

    /// Forward a `KHR_debug` message into `tracing`, at a level matching its severity.
    #[cfg(not(target_vendor = "apple"))]
    fn debug_message_callback(source: u32, kind: u32, id: u32, severity: u32, message: &str) {
        let source = match source {
            glow::DEBUG_SOURCE_API => "api",
            glow::DEBUG_SOURCE_WINDOW_SYSTEM => "window-system",
            glow::DEBUG_SOURCE_SHADER_COMPILER => "shader-compiler",
            glow::DEBUG_SOURCE_THIRD_PARTY => "third-party",
            glow::DEBUG_SOURCE_APPLICATION => "application",
            _ => "other",
        };
        let kind = match kind {
            glow::DEBUG_TYPE_ERROR => "error",
            glow::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "deprecated",
            glow::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "undefined-behavior",
            glow::DEBUG_TYPE_PORTABILITY => "portability",
            glow::DEBUG_TYPE_PERFORMANCE => "performance",
            _ => "other",
        };

        match severity {
            glow::DEBUG_SEVERITY_HIGH => tracing::error!(source, kind, id, "{message}"),
            glow::DEBUG_SEVERITY_MEDIUM => tracing::warn!(source, kind, id, "{message}"),
            glow::DEBUG_SEVERITY_LOW => tracing::info!(source, kind, id, "{message}"),
            _ => tracing::trace!(source, kind, id, "{message}"),
        }
    }
}
