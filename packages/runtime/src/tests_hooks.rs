#[cfg(test)]
mod hook_tests {
    use crate::test_support::{export, fire, interpreter_with, register, render, with_files};
    use crate::{
        HostServices, StaticSession, UserInfo, VNode, WorkflowReply, WorkflowService, WorkflowSink, WorkflowStream,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn button(node: &VNode) -> &VNode {
        node.find_tag("button").unwrap()
    }

    #[test]
    fn test_state_survives_rerenders() {
        let mut interp = with_files(&[(
            "pages/index.tsx",
            r#"
            import { useState } from "@platform";
            export default function Counter() {
                const [count, setCount] = useState(() => 1);
                return <button onClick={() => setCount(c => c + 1)}>Count: {count}</button>;
            }
            "#,
        )]);
        let node = render(&mut interp, "pages/index");
        assert_eq!(node.text_content(), "Count: 1");
        assert!(!interp.take_dirty());

        fire(&mut interp, &node, "click");
        fire(&mut interp, &node, "click");
        assert!(interp.take_dirty());
        let node = render(&mut interp, "pages/index");
        assert_eq!(button(&node).text_content(), "Count: 3");
    }

    #[test]
    fn test_setting_the_same_value_is_not_a_change() {
        let mut interp = with_files(&[(
            "pages/index.tsx",
            r#"
            import { useState } from "@platform";
            export default function Same() {
                const [value, setValue] = useState("a");
                return <button onClick={() => setValue("a")}>{value}</button>;
            }
            "#,
        )]);
        let node = render(&mut interp, "pages/index");
        fire(&mut interp, &node, "click");
        assert!(!interp.take_dirty());
    }

    const EFFECTS: &str = r#"
        import { useState, useEffect } from "@platform";
        export const log = [];
        function Child({ label }) {
            useEffect(() => {
                log.push("mount " + label);
                return () => log.push("cleanup " + label);
            }, [label]);
            useEffect(() => { log.push("every"); });
            return <span>{label}</span>;
        }
        export default function Parent() {
            const [show, setShow] = useState(true);
            const [label, setLabel] = useState("a");
            return (
                <div>
                    <button onClick={() => setShow(s => !s)}>toggle</button>
                    <input onChange={() => setLabel("b")} />
                    {show ? <Child label={label} /> : null}
                </div>
            );
        }
    "#;

    fn log(interp: &mut crate::Interpreter) -> String {
        export(interp, "pages/index", "log").display()
    }

    #[test]
    fn test_effects_run_after_commit_and_clean_up() {
        let mut interp = with_files(&[("pages/index.tsx", EFFECTS)]);
        let node = render(&mut interp, "pages/index");
        assert_eq!(log(&mut interp), "mount a,every");

        // unchanged deps: only the dependency-free effect runs again
        render(&mut interp, "pages/index");
        assert_eq!(log(&mut interp), "mount a,every,every");

        // changed deps: cleanup of the previous run first
        let input = node.find_tag("input").unwrap();
        fire(&mut interp, input, "change");
        let node = render(&mut interp, "pages/index");
        assert_eq!(log(&mut interp), "mount a,every,every,cleanup a,mount b,every");

        // unmount
        fire(&mut interp, button(&node), "click");
        render(&mut interp, "pages/index");
        assert_eq!(
            log(&mut interp),
            "mount a,every,every,cleanup a,mount b,every,cleanup b"
        );
    }

    #[test]
    fn test_memo_and_ref() {
        let mut interp = with_files(&[(
            "pages/index.tsx",
            r#"
            import { useMemo, useRef, useState } from "@platform";
            export let computed = 0;
            export default function Page() {
                const [n, setN] = useState(1);
                const [other, setOther] = useState(0);
                const renders = useRef(0);
                renders.current += 1;
                const doubled = useMemo(() => { computed += 1; return n * 2; }, [n]);
                return (
                    <div>
                        <button onClick={() => setOther(o => o + 1)}>other</button>
                        <input onChange={() => setN(x => x + 1)} />
                        <p>{doubled}/{renders.current}</p>
                    </div>
                );
            }
            "#,
        )]);
        let node = render(&mut interp, "pages/index");
        fire(&mut interp, button(&node), "click");
        let node = render(&mut interp, "pages/index");
        assert_eq!(node.find_tag("p").unwrap().text_content(), "2/2");

        fire(&mut interp, node.find_tag("input").unwrap(), "change");
        let node = render(&mut interp, "pages/index");
        assert_eq!(node.find_tag("p").unwrap().text_content(), "4/3");
        assert_eq!(export(&mut interp, "pages/index", "computed").display(), "2");
    }

    #[test]
    fn test_hooks_outside_components_fail() {
        let mut interp = with_files(&[(
            "modules/bad.ts",
            r#"import { useState } from "@platform"; export const state = useState(0);"#,
        )]);
        let err = interp.load_module("modules/bad").err().unwrap();
        assert!(err.to_string().contains("while a component renders"));
    }

    #[test]
    fn test_app_state_is_shared_across_pages() {
        let mut interp = with_files(&[
            (
                "pages/index.tsx",
                r#"
                import { useAppState } from "@platform";
                export default function Home() {
                    const [filter, setFilter] = useAppState("filter", "all");
                    return <button onClick={() => setFilter("open")}>{filter}</button>;
                }
                "#,
            ),
            (
                "pages/other.tsx",
                r#"
                import { useAppState } from "@platform";
                export default function Other() {
                    const [filter] = useAppState("filter", "ignored");
                    return <p>{filter}</p>;
                }
                "#,
            ),
        ]);
        let node = render(&mut interp, "pages/index");
        assert_eq!(node.text_content(), "all");
        fire(&mut interp, &node, "click");

        let other = render(&mut interp, "pages/other");
        assert_eq!(other.text_content(), "open");
        assert_eq!(interp.app_state("filter").map(|v| v.display()), Some("open".into()));
    }

    #[test]
    fn test_user_accessor() {
        let services = HostServices {
            session: Arc::new(StaticSession::user(UserInfo {
                id: "u1".into(),
                name: "Ada".into(),
                email: None,
                roles: vec!["admin".into()],
            })),
            ..HostServices::default()
        };
        let mut interp = interpreter_with(services);
        register(
            &mut interp,
            &[(
                "pages/index.tsx",
                r#"
                import { useUser } from "@platform";
                export default function Me() {
                    const user = useUser();
                    return <p>{user.name}:{String(user.hasRole("admin"))}:{String(user.hasRole("owner"))}</p>;
                }
                "#,
            )],
        );
        assert_eq!(render(&mut interp, "pages/index").text_content(), "Ada:true:false");
    }

    #[test]
    fn test_anonymous_user() {
        let mut interp = with_files(&[(
            "pages/index.tsx",
            r#"
            import { useUser } from "@platform";
            export default () => { const user = useUser(); return <p>{user.isAuthenticated ? "in" : "out"}</p> };
            "#,
        )]);
        assert_eq!(render(&mut interp, "pages/index").text_content(), "out");
    }

    // ---- workflows ----

    #[derive(Default)]
    struct Streaming {
        sinks: Mutex<Vec<WorkflowSink>>,
        params: Mutex<Vec<serde_json::Value>>,
    }

    impl WorkflowService for Streaming {
        fn invoke(&self, _name: &str, params: serde_json::Value) -> Result<WorkflowReply, String> {
            let (stream, sink) = WorkflowStream::channel();
            self.sinks.lock().unwrap().push(sink);
            self.params.lock().unwrap().push(params);
            Ok(WorkflowReply::Stream(stream))
        }
    }

    const WORKFLOW_PAGE: &str = r#"
        import { useState, useWorkflow } from "@platform";
        function Report() {
            const job = useWorkflow("build-report");
            return (
                <section>
                    <button onClick={() => job.run({ month: 3 })}>run</button>
                    <p>{job.status}|{job.logs.join(";")}|{job.result ? job.result.rows : "-"}|{job.error ?? "-"}</p>
                </section>
            );
        }
        export default function Page() {
            const [show, setShow] = useState(true);
            return <div><input onChange={() => setShow(false)} />{show ? <Report /> : null}</div>;
        }
    "#;

    #[test]
    fn test_workflow_streams_status_and_logs() {
        let service = Arc::new(Streaming::default());
        let mut interp = interpreter_with(HostServices {
            workflows: service.clone(),
            ..HostServices::default()
        });
        register(&mut interp, &[("pages/index.tsx", WORKFLOW_PAGE)]);

        let status = |node: &VNode| node.find_tag("p").unwrap().text_content();
        let node = render(&mut interp, "pages/index");
        assert_eq!(status(&node), "idle||-|-");

        fire(&mut interp, button(&node), "click");
        assert_eq!(service.params.lock().unwrap()[0], json!({"month": 3}));
        let node = render(&mut interp, "pages/index");
        assert!(status(&node).starts_with("running|"));

        let sink = service.sinks.lock().unwrap().remove(0);
        sink.log("fetching");
        sink.log("aggregating");
        assert_eq!(interp.pump_workflows(), 2);
        assert!(interp.take_dirty());
        let node = render(&mut interp, "pages/index");
        assert_eq!(status(&node), "running|fetching;aggregating|-|-");

        sink.complete(json!({"rows": 12}));
        interp.pump_workflows();
        let node = render(&mut interp, "pages/index");
        assert_eq!(status(&node), "completed|fetching;aggregating|12|-");
    }

    #[test]
    fn test_workflow_failure_is_data() {
        let service = Arc::new(Streaming::default());
        let mut interp = interpreter_with(HostServices {
            workflows: service.clone(),
            ..HostServices::default()
        });
        register(&mut interp, &[("pages/index.tsx", WORKFLOW_PAGE)]);
        let node = render(&mut interp, "pages/index");
        fire(&mut interp, button(&node), "click");

        let sink = service.sinks.lock().unwrap().remove(0);
        sink.fail("quota exceeded");
        interp.pump_workflows();
        let node = render(&mut interp, "pages/index");
        assert!(node.errors().is_empty());
        assert_eq!(node.find_tag("p").unwrap().text_content(), "failed||-|quota exceeded");
    }

    #[test]
    fn test_unmount_does_not_cancel_workflows() {
        let service = Arc::new(Streaming::default());
        let mut interp = interpreter_with(HostServices {
            workflows: service.clone(),
            ..HostServices::default()
        });
        register(&mut interp, &[("pages/index.tsx", WORKFLOW_PAGE)]);
        let node = render(&mut interp, "pages/index");
        fire(&mut interp, button(&node), "click");
        assert_eq!(interp.workflows().running(), 1);

        fire(&mut interp, node.find_tag("input").unwrap(), "change");
        let node = render(&mut interp, "pages/index");
        assert!(node.find_tag("section").is_none());
        assert_eq!(interp.workflows().running(), 1);

        let mut sink = service.sinks.lock().unwrap().remove(0);
        assert!(!sink.is_cancelled());
    }

    #[test]
    fn test_rerunning_a_workflow_drops_the_finished_invocation() {
        let service = Arc::new(Streaming::default());
        let mut interp = interpreter_with(HostServices {
            workflows: service.clone(),
            ..HostServices::default()
        });
        register(&mut interp, &[("pages/index.tsx", WORKFLOW_PAGE)]);

        for round in 0..3 {
            let node = render(&mut interp, "pages/index");
            fire(&mut interp, button(&node), "click");
            let sink = service.sinks.lock().unwrap().remove(0);
            sink.complete(json!({ "rows": round }));
            interp.pump_workflows();
        }
        assert_eq!(interp.workflows().len(), 1);
        let node = render(&mut interp, "pages/index");
        assert_eq!(node.find_tag("p").unwrap().text_content(), "completed||2|-");
    }
}
